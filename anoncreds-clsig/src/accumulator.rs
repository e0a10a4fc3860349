//! Accumulator over the set of revoked registry elements, with non-membership witnesses
//!
//! The accumulator value is `f(a) * P` where `f(x)` is the product of `(x + y)` over the
//! revoked elements `y`, `a` is the registry secret and `P` the G1 generator. The tails
//! table holds the points `a^k * P`, which lets a holder compute its witness without
//! knowing the secret.

use alloc::vec::Vec;

use bls12_381::{pairing, G1Affine, G1Projective, G2Affine, G2Projective, Scalar};
use ff::Field;
use group::Curve;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{
    error::Error,
    hash::HashScalar,
    keys::{KeyPair, PublicKey},
    util::LinearSum,
};

const REGISTRY_ELEMENT_DST: &[u8] = b"ANONCREDS_REVOCATION_ELEMENT_V1";
const REGISTRY_ID_DST: &[u8] = b"ANONCREDS_REVOCATION_REGISTRY_V1";

/// Derive the accumulator element for a registry index
pub fn registry_element(registry_id: &str, index: u32) -> Scalar {
    let mut hash = HashScalar::new(Some(REGISTRY_ELEMENT_DST));
    hash.update(registry_id.as_bytes());
    hash.update(index.to_be_bytes());
    hash.finalize().next()
}

/// Derive the signed message naming the registry of a revocable credential
pub fn registry_id_message(registry_id: &str) -> Scalar {
    HashScalar::digest(registry_id.as_bytes(), Some(REGISTRY_ID_DST))
}

fn invert(value: Scalar) -> Result<Scalar, Error> {
    Option::<Scalar>::from(value.invert()).ok_or_else(|| err_msg!(Unexpected, "Zero divisor"))
}

impl_point_type!(Accumulator, G1Affine, "An accumulator value");

impl Accumulator {
    /// The accumulator value for an empty revoked set
    pub fn initial() -> Self {
        Self(G1Affine::generator())
    }

    /// Compute the accumulator value for a set of revoked elements
    pub fn from_revoked(
        key: &KeyPair,
        revoked: impl IntoIterator<Item = Scalar>,
    ) -> Result<Self, Error> {
        let alpha = key.secret_scalar()?;
        let mut factor = Scalar::one();
        for y in revoked {
            factor *= alpha + y;
        }
        Ok(Self((G1Projective::generator() * factor).to_affine()))
    }

    /// Add and remove elements from the revoked set, with cost proportional to the
    /// number of changed elements
    pub fn update(
        &self,
        key: &KeyPair,
        revoked: &[Scalar],
        issued: &[Scalar],
    ) -> Result<Self, Error> {
        let alpha = key.secret_scalar()?;
        let mut added = Scalar::one();
        for y in revoked {
            added *= alpha + y;
        }
        let mut removed = Scalar::one();
        for y in issued {
            removed *= alpha + y;
        }
        let factor = added * invert(removed)?;
        Ok(Self((self.0 * factor).to_affine()))
    }
}

/// Sequential access to the tails table, starting from the first point
pub trait Tails {
    type Error: From<Error>;

    fn next_tail(&mut self) -> Result<G1Affine, Self::Error>;
}

/// Produces the tails table for a registry secret
#[derive(Clone, Debug)]
pub struct TailsGenerator {
    current: G1Projective,
    factor: Scalar,
    remaining: usize,
}

impl TailsGenerator {
    pub fn new(key: &KeyPair, count: usize) -> Result<Self, Error> {
        Ok(Self {
            current: G1Projective::generator(),
            factor: *key.secret_scalar()?,
            remaining: count,
        })
    }
}

impl Iterator for TailsGenerator {
    type Item = G1Affine;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let point = self.current.to_affine();
        self.current *= self.factor;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for TailsGenerator {}

/// Coefficients (lowest degree first) of the product of `(x + y)` over the roots
fn poly_from_roots(roots: &[Scalar]) -> Vec<Scalar> {
    let mut coeffs = Vec::with_capacity(roots.len() + 1);
    coeffs.push(Scalar::one());
    for y in roots {
        coeffs.push(Scalar::zero());
        for k in (1..coeffs.len()).rev() {
            let prev = coeffs[k - 1];
            coeffs[k] = prev + y * coeffs[k];
        }
        coeffs[0] *= y;
    }
    coeffs
}

/// Divide a polynomial by `(x + y)`, returning the quotient and remainder
fn divide_by_root(coeffs: &[Scalar], y: &Scalar) -> (Vec<Scalar>, Scalar) {
    let n = coeffs.len();
    if n < 2 {
        return (Vec::new(), coeffs.first().copied().unwrap_or_else(Scalar::zero));
    }
    let mut quot = alloc::vec![Scalar::zero(); n - 1];
    quot[n - 2] = coeffs[n - 1];
    for k in (1..n - 1).rev() {
        quot[k - 1] = coeffs[k] - y * quot[k];
    }
    let rem = coeffs[0] - y * quot[0];
    (quot, rem)
}

/// A witness that an element is not a member of the revoked set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonMembershipWitness {
    #[serde(with = "crate::serde_utils::as_hex")]
    pub(crate) omega: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    pub(crate) d: Scalar,
}

impl NonMembershipWitness {
    /// Create a witness directly from the registry secret
    pub fn issue(
        key: &KeyPair,
        accum: &Accumulator,
        element: &Scalar,
        revoked: impl IntoIterator<Item = Scalar>,
    ) -> Result<Self, Error> {
        let alpha = key.secret_scalar()?;
        let mut d = Scalar::one();
        for y in revoked {
            d *= y - element;
        }
        if bool::from(d.is_zero()) {
            return Err(err_msg!(InvalidWitness, "Element is in the revoked set"));
        }
        let exp = invert(alpha + element)?;
        let omega = ((G1Projective::from(accum.0) - G1Projective::generator() * d) * exp).to_affine();
        Ok(Self { omega, d })
    }

    /// Compute a witness from the tails table and the revoked set. Cost is quadratic in
    /// the number of revoked elements and reads one tails point per revoked element.
    pub fn from_tails<T: Tails>(
        element: &Scalar,
        revoked: &[Scalar],
        tails: &mut T,
    ) -> Result<Self, T::Error> {
        let coeffs = poly_from_roots(revoked);
        let (quot, d) = divide_by_root(&coeffs, element);
        if bool::from(d.is_zero()) {
            return Err(err_msg!(InvalidWitness, "Element is in the revoked set").into());
        }
        let mut omega = LinearSum::new();
        for q in quot {
            let point = tails.next_tail()?;
            omega.add_term(point.into(), q);
        }
        Ok(Self {
            omega: omega.total().to_affine(),
            d,
        })
    }

    /// Update the witness after a single element was added to the revoked set
    pub fn update_revoked(
        &self,
        element: &Scalar,
        revoked_element: &Scalar,
        prev_accum: &Accumulator,
    ) -> Result<Self, Error> {
        let diff = revoked_element - element;
        if bool::from(diff.is_zero()) {
            return Err(err_msg!(InvalidWitness, "Element is in the revoked set"));
        }
        let omega = (G1Projective::from(prev_accum.0) + self.omega * diff).to_affine();
        Ok(Self {
            omega,
            d: self.d * diff,
        })
    }

    /// Update the witness after a single element was removed from the revoked set
    pub fn update_issued(
        &self,
        element: &Scalar,
        issued_element: &Scalar,
        accum: &Accumulator,
    ) -> Result<Self, Error> {
        let diff = invert(issued_element - element)?;
        let omega = ((G1Projective::from(self.omega) - G1Projective::from(accum.0)) * diff).to_affine();
        Ok(Self {
            omega,
            d: self.d * diff,
        })
    }

    /// Check the witness against an accumulator value and registry public key
    pub fn verify(
        &self,
        element: &Scalar,
        accum: &Accumulator,
        registry_key: &PublicKey,
    ) -> Result<(), Error> {
        let lhs = pairing(
            &self.omega,
            &(G2Projective::generator() * element + G2Projective::from(registry_key.0)).to_affine(),
        );
        let rhs = pairing(
            &(G1Projective::from(accum.0) - G1Projective::generator() * self.d).to_affine(),
            &G2Affine::generator(),
        );
        if bool::from(!self.d.is_zero() & lhs.ct_eq(&rhs)) {
            Ok(())
        } else {
            Err(err_msg!(InvalidWitness))
        }
    }

    pub fn omega(&self) -> &G1Affine {
        &self.omega
    }

    pub fn d(&self) -> &Scalar {
        &self.d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    struct MemTails(TailsGenerator);

    impl Tails for MemTails {
        type Error = Error;

        fn next_tail(&mut self) -> Result<G1Affine, Error> {
            self.0.next().ok_or_else(|| err_msg!(Usage, "Tails exhausted"))
        }
    }

    #[test]
    fn polynomial_division() {
        let roots = [Scalar::from(2u64), Scalar::from(3u64)];
        let coeffs = poly_from_roots(&roots);
        // (x + 2)(x + 3) = x^2 + 5x + 6
        assert_eq!(
            coeffs,
            [Scalar::from(6u64), Scalar::from(5u64), Scalar::one()]
        );
        let (quot, rem) = divide_by_root(&coeffs, &Scalar::from(2u64));
        assert_eq!(quot, [Scalar::from(3u64), Scalar::one()]);
        assert_eq!(rem, Scalar::zero());
        let (_, rem) = divide_by_root(&coeffs, &Scalar::from(1u64));
        // f(-1) = 1 - 5 + 6
        assert_eq!(rem, Scalar::from(2u64));
    }

    #[test]
    fn registry_messages_are_distinct() {
        assert_ne!(registry_id_message("reg"), registry_id_message("reg2"));
        assert_ne!(registry_element("reg", 1), registry_element("reg2", 1));
        assert_ne!(registry_element("reg", 1), registry_element("reg", 2));
        assert_ne!(registry_id_message("reg"), registry_element("reg", 0));
    }

    #[test]
    fn witness_from_tails_matches_issued() {
        let key = KeyPair::random_with_rng(OsRng);
        let revoked: Vec<Scalar> = (1..4).map(|i| registry_element("reg", i)).collect();
        let element = registry_element("reg", 7);
        let accum = Accumulator::from_revoked(&key, revoked.iter().copied()).unwrap();

        let issued =
            NonMembershipWitness::issue(&key, &accum, &element, revoked.iter().copied()).unwrap();
        let mut tails = MemTails(TailsGenerator::new(&key, 10).unwrap());
        let computed = NonMembershipWitness::from_tails(&element, &revoked, &mut tails).unwrap();
        assert_eq!(issued, computed);
        computed
            .verify(&element, &accum, key.public_key())
            .expect("Error verifying witness");

        let mut tails = MemTails(TailsGenerator::new(&key, 10).unwrap());
        assert!(NonMembershipWitness::from_tails(&revoked[0], &revoked, &mut tails).is_err());
    }

    #[test]
    fn witness_single_step_updates() {
        let key = KeyPair::random_with_rng(OsRng);
        let element = registry_element("reg", 5);
        let other = registry_element("reg", 6);
        let accum = Accumulator::initial();
        let witness = NonMembershipWitness::issue(&key, &accum, &element, []).unwrap();
        witness.verify(&element, &accum, key.public_key()).unwrap();

        let revoked_accum = accum.update(&key, &[other], &[]).unwrap();
        let witness_r = witness.update_revoked(&element, &other, &accum).unwrap();
        witness_r
            .verify(&element, &revoked_accum, key.public_key())
            .expect("Error verifying updated witness");
        assert!(witness
            .verify(&element, &revoked_accum, key.public_key())
            .is_err());

        let issued_accum = revoked_accum.update(&key, &[], &[other]).unwrap();
        assert_eq!(issued_accum, accum);
        let witness_i = witness_r
            .update_issued(&element, &other, &issued_accum)
            .unwrap();
        witness_i
            .verify(&element, &issued_accum, key.public_key())
            .expect("Error verifying reissued witness");
    }
}
