//! Proof that an issuer public key was generated from a known secret

use bls12_381::{G2Affine, G2Projective, Scalar};
use group::Curve;
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    challenge::ProofChallenge,
    error::Error,
    hash::HashScalar,
    keys::{KeyPair, PublicKey},
    util::random_nonce,
};

const KEY_PROOF_DST: &[u8] = b"ANONCREDS_KEY_CORRECTNESS_PROOF_V1";

/// A Schnorr proof of knowledge of the issuer secret key, bound to the message count
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCorrectnessProof {
    c: ProofChallenge,
    #[serde(with = "crate::serde_utils::as_hex")]
    x_cap: Scalar,
}

impl KeyCorrectnessProof {
    pub fn new_with_rng(
        keypair: &KeyPair,
        message_count: usize,
        rng: impl CryptoRng + Rng,
    ) -> Result<Self, Error> {
        let x = keypair.secret_scalar()?;
        let t = random_nonce(rng);
        let t_point = (G2Projective::generator() * t).to_affine();
        let c = Self::challenge(keypair.public_key(), message_count, &t_point);
        Ok(Self {
            c: ProofChallenge(c),
            x_cap: t - c * x,
        })
    }

    pub fn verify(&self, public_key: &PublicKey, message_count: usize) -> Result<(), Error> {
        if bool::from(public_key.0.is_identity()) {
            return Err(err_msg!(InvalidProof, "Invalid public key"));
        }
        let t_point =
            (G2Projective::generator() * self.x_cap + public_key.0 * self.c.0).to_affine();
        if Self::challenge(public_key, message_count, &t_point) == self.c.0 {
            Ok(())
        } else {
            Err(err_msg!(InvalidProof, "Key correctness proof mismatch"))
        }
    }

    fn challenge(public_key: &PublicKey, message_count: usize, t_point: &G2Affine) -> Scalar {
        let mut hash = HashScalar::new(Some(KEY_PROOF_DST));
        hash.update(public_key.0.to_compressed());
        hash.update((message_count as u32).to_be_bytes());
        hash.update(t_point.to_compressed());
        hash.finalize().next()
    }
}
