use bls12_381::{G1Projective, Scalar};
use rand::{CryptoRng, Rng};
use subtle::ConstantTimeEq;

#[cfg(feature = "getrandom")]
use rand::rngs::OsRng;

/// The operating system RNG
#[cfg(feature = "getrandom")]
#[inline]
pub fn default_rng() -> OsRng {
    OsRng
}

/// Sample a uniform non-zero scalar
pub fn random_nonce<R: CryptoRng + Rng>(mut rng: R) -> Scalar {
    let mut wide = [0u8; 64];
    loop {
        rng.fill_bytes(&mut wide);
        let value = Scalar::from_bytes_wide(&wide);
        if !bool::from(value.ct_eq(&Scalar::zero())) {
            return value;
        }
    }
}

/// Map a signed integer into the scalar field
pub fn scalar_from_i64(value: i64) -> Scalar {
    let magnitude = Scalar::from(value.unsigned_abs());
    if value < 0 {
        -magnitude
    } else {
        magnitude
    }
}

impl_scalar_type!(Nonce, "A random scalar, used for challenge freshness and as a blinding factor");

impl Nonce {
    #[cfg(feature = "getrandom")]
    pub fn random() -> Self {
        Self::random_with_rng(default_rng())
    }

    pub fn random_with_rng(rng: impl CryptoRng + Rng) -> Self {
        Self(random_nonce(rng))
    }
}

/// A linear combination of G1 points, built up term by term
#[derive(Clone, Copy, Debug)]
pub(crate) struct LinearSum(G1Projective);

impl Default for LinearSum {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearSum {
    pub fn new() -> Self {
        Self(G1Projective::identity())
    }

    /// Start from a point with an implicit factor of one
    pub fn starting_at(point: impl Into<G1Projective>) -> Self {
        Self(point.into())
    }

    /// Evaluate a complete set of terms
    pub fn of(terms: &[(G1Projective, Scalar)]) -> G1Projective {
        let mut sum = Self::new();
        sum.add_terms(terms);
        sum.total()
    }

    #[inline]
    pub fn add_term(&mut self, point: G1Projective, factor: Scalar) {
        self.0 += point * factor;
    }

    pub fn add_terms(&mut self, terms: &[(G1Projective, Scalar)]) {
        for (point, factor) in terms {
            self.add_term(*point, *factor);
        }
    }

    pub fn total(&self) -> G1Projective {
        self.0
    }

    /// The total with one more term, leaving the sum unchanged
    pub fn total_with(&self, point: G1Projective, factor: Scalar) -> G1Projective {
        self.0 + point * factor
    }
}
