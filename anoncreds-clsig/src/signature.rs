//! BBS+ signatures over a vector of scalar messages
//!
//! A signature `(A, e, s)` on messages `m_1..m_n` satisfies
//! `e(A, g2^e * X) = e(g1 + h0 * s + sum(h_i * m_i), g2)`. The issuer derives `e`
//! and `s` deterministically from the messages and its secret key.

use bls12_381::{pairing, G1Affine, G1Projective, G2Affine, G2Projective, Scalar};
use group::Curve;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{
    commitment::{Blinding, Commitment},
    error::Error,
    generators::Generators,
    hash::HashScalar,
    io::FixedLengthBytes,
    keys::KeyPair,
    util::LinearSum,
};

/// A single signed value, reduced into the scalar field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Message(pub(crate) Scalar);

impl Message {
    /// Map arbitrary bytes to a message
    pub fn hash(input: impl AsRef<[u8]>) -> Self {
        Self(HashScalar::digest(input, None))
    }

    pub fn from_bytes(buf: &[u8; 32]) -> Result<Self, Error> {
        <Scalar as FixedLengthBytes>::from_bytes(buf).map(Self)
    }

    /// Big-endian encoding, matching [`FixedLengthBytes`]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.with_bytes(|b| *b)
    }

    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }
}

impl From<Scalar> for Message {
    fn from(value: Scalar) -> Self {
        Self(value)
    }
}

impl From<u64> for Message {
    fn from(value: u64) -> Self {
        Self(Scalar::from(value))
    }
}

const POINT_LEN: usize = 48;
const SCALAR_LEN: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "crate::serde_utils::as_hex")]
    pub(crate) a: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    pub(crate) e: Scalar,
    #[serde(with = "crate::serde_utils::as_hex")]
    pub(crate) s: Scalar,
}

impl Signature {
    pub const SIZE: usize = POINT_LEN + 2 * SCALAR_LEN;

    /// The compressed point `A` followed by the scalars `e` and `s`
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        let (point, scalars) = out.split_at_mut(POINT_LEN);
        point.copy_from_slice(&self.a.to_compressed());
        let (e, s) = scalars.split_at_mut(SCALAR_LEN);
        self.e.with_bytes(|b| e.copy_from_slice(b));
        self.s.with_bytes(|b| s.copy_from_slice(b));
        out
    }

    pub fn from_bytes(sig: impl AsRef<[u8]>) -> Result<Self, Error> {
        let sig = sig.as_ref();
        if sig.len() != Self::SIZE {
            return Err(err_msg!(InvalidSignature));
        }
        let (point, scalars) = sig.split_at(POINT_LEN);
        let (e, s) = scalars.split_at(SCALAR_LEN);
        let invalid = |_| err_msg!(InvalidSignature);
        Ok(Self {
            a: G1Affine::from_slice(point).map_err(invalid)?,
            e: Scalar::from_slice(e).map_err(invalid)?,
            s: Scalar::from_slice(s).map_err(invalid)?,
        })
    }

    /// Convert a blind signature into a signature over the committed messages
    pub fn unblind(mut self, blinding: Blinding) -> Self {
        self.s += blinding.0;
        self
    }
}

/// The role a [`SignatureMessages`] instance is playing
#[derive(Clone, Debug)]
enum Mode {
    /// Signing: absorb every message to derive `e` and `s`
    Sign(HashScalar<'static>),
    Verify,
}

/// Accumulates messages in generator order, then signs or checks a signature
#[derive(Clone, Debug)]
pub struct SignatureMessages<'g, G: Generators> {
    base: LinearSum,
    filled: usize,
    gens: &'g G,
    keypair: &'g KeyPair,
    mode: Mode,
}

impl<'g, G: Generators> SignatureMessages<'g, G> {
    fn with_mode(gens: &'g G, keypair: &'g KeyPair, start: G1Projective, mode: Mode) -> Self {
        Self {
            base: LinearSum::starting_at(start),
            filled: 0,
            gens,
            keypair,
            mode,
        }
    }

    pub fn signer(gens: &'g G, keypair: &'g KeyPair) -> Self {
        Self::with_mode(
            gens,
            keypair,
            G1Projective::generator(),
            Mode::Sign(HashScalar::new(None)),
        )
    }

    /// Sign over a holder commitment. The committed slots are skipped with
    /// [`push_committed_count`](Self::push_committed_count).
    pub fn signer_from_commitment(commitment: Commitment, gens: &'g G, keypair: &'g KeyPair) -> Self {
        let mut seed = HashScalar::new(None);
        seed.update(commitment.0.to_compressed());
        Self::with_mode(
            gens,
            keypair,
            G1Projective::generator() + commitment.0,
            Mode::Sign(seed),
        )
    }

    pub fn verifier(gens: &'g G, keypair: &'g KeyPair) -> Self {
        Self::with_mode(gens, keypair, G1Projective::generator(), Mode::Verify)
    }
}

impl<G: Generators> SignatureMessages<'_, G> {
    fn reserve(&mut self, count: usize) -> Result<usize, Error> {
        let start = self.filled;
        match start.checked_add(count) {
            Some(end) if end <= self.gens.message_count() => {
                self.filled = end;
                Ok(start)
            }
            _ => Err(err_msg!(Usage, "Message index exceeds generator count")),
        }
    }

    pub fn push(&mut self, message: Message) -> Result<(), Error> {
        let index = self.reserve(1)?;
        self.base.add_term(self.gens.message(index), message.0);
        if let Mode::Sign(hash) = &mut self.mode {
            hash.update(message.0.to_bytes());
        }
        Ok(())
    }

    pub fn append(&mut self, messages: impl IntoIterator<Item = Message>) -> Result<(), Error> {
        messages.into_iter().try_for_each(|msg| self.push(msg))
    }

    /// Skip message slots already bound into the commitment
    pub fn push_committed_count(&mut self, count: usize) -> Result<(), Error> {
        self.reserve(count).map(|_| ())
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    fn check_complete(&self) -> Result<(), Error> {
        if self.filled == self.gens.message_count() {
            Ok(())
        } else {
            Err(err_msg!(Usage, "Message count does not match generator count"))
        }
    }

    pub fn sign(&self) -> Result<Signature, Error> {
        self.check_complete()?;
        let mut hash = match &self.mode {
            Mode::Sign(hash) => hash.clone(),
            Mode::Verify => return Err(err_msg!(Usage, "Missing signer state")),
        };
        let sk = self.keypair.secret_scalar()?;
        hash.update(sk.to_bytes());
        let mut output = hash.finalize();
        let e = output.next();
        let s = output.next();
        let inverse = Option::<Scalar>::from((sk + e).invert())
            .ok_or_else(|| err_msg!(Unexpected, "Invalid signature exponent"))?;
        let a = self.base.total_with(self.gens.blinding(), s) * inverse;
        Ok(Signature {
            a: a.to_affine(),
            e,
            s,
        })
    }

    pub fn verify_signature(&self, signature: &Signature) -> Result<(), Error> {
        self.check_complete()?;
        let b = self.base.total_with(self.gens.blinding(), signature.s);
        let w = G2Projective::generator() * signature.e + self.keypair.public_key().0;
        let lhs = pairing(&signature.a, &w.to_affine());
        let rhs = pairing(&b.to_affine(), &G2Affine::generator());
        if bool::from(lhs.ct_eq(&rhs)) {
            Ok(())
        } else {
            Err(err_msg!(InvalidSignature))
        }
    }
}
