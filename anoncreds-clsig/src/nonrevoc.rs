//! Zero-knowledge proof that a hidden registry element is not in the revoked set
//!
//! The holder randomizes its witness and proves knowledge of the element, the
//! randomizer and the (non-zero) witness remainder. The element blinding is shared
//! with the signature proof, which ties the registry element to the credential.

use bls12_381::{pairing, G1Affine, G1Projective, G2Affine, Scalar};
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{
    accumulator::{Accumulator, NonMembershipWitness},
    buffer::WriteBuffer,
    challenge::{CreateChallenge, ProofChallenge},
    commitment::Blinding,
    error::Error,
    generators::pedersen_base,
    keys::PublicKey,
    util::{random_nonce, LinearSum},
};

fn write_points(writer: &mut dyn WriteBuffer, points: &[&G1Affine]) -> Result<(), Error> {
    for pt in points {
        writer.buffer_write(&pt.to_uncompressed())?;
    }
    Ok(())
}

/// A prepared non-revocation proof awaiting the aggregate challenge
#[derive(Clone, Debug)]
pub struct NonRevocationProofContext {
    accum: G1Affine,
    w_prime: G1Affine,
    a_bar: G1Affine,
    e_d: G1Affine,
    t1: G1Affine,
    t2: G1Affine,
    t3: G1Affine,
    secrets: [(Scalar, Scalar); 5],
}

impl NonRevocationProofContext {
    pub fn complete(&self, challenge: ProofChallenge) -> Result<NonRevocationProof, Error> {
        let c = challenge.0;
        let [r1, delta, rho, delta_inv, rho_prime] = self.secrets.map(|(x, t)| t - c * x);
        Ok(NonRevocationProof {
            w_prime: self.w_prime,
            a_bar: self.a_bar,
            e_d: self.e_d,
            t1: self.t1,
            t2: self.t2,
            t3: self.t3,
            r1_resp: r1,
            delta_resp: delta,
            rho_resp: rho,
            delta_inv_resp: delta_inv,
            rho_prime_resp: rho_prime,
        })
    }
}

impl CreateChallenge for NonRevocationProofContext {
    fn write_challenge_bytes(&self, writer: &mut dyn WriteBuffer) -> Result<(), Error> {
        write_points(
            writer,
            &[
                &self.accum,
                &self.w_prime,
                &self.a_bar,
                &self.e_d,
                &self.t1,
                &self.t2,
                &self.t3,
            ],
        )
    }
}

/// A proof that a hidden registry element is absent from an accumulator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonRevocationProof {
    #[serde(with = "crate::serde_utils::as_hex")]
    w_prime: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    a_bar: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    e_d: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    t1: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    t2: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    t3: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    r1_resp: Scalar,
    #[serde(with = "crate::serde_utils::as_hex")]
    delta_resp: Scalar,
    #[serde(with = "crate::serde_utils::as_hex")]
    rho_resp: Scalar,
    #[serde(with = "crate::serde_utils::as_hex")]
    delta_inv_resp: Scalar,
    #[serde(with = "crate::serde_utils::as_hex")]
    rho_prime_resp: Scalar,
}

impl NonRevocationProof {
    /// Randomize a witness and commit to the proof blindings. The element blinding
    /// must be the one used for the element in the accompanying signature proof.
    pub fn prepare_with_rng(
        witness: &NonMembershipWitness,
        accum: &Accumulator,
        element: &Scalar,
        element_blinding: Blinding,
        mut rng: impl CryptoRng + Rng,
    ) -> Result<NonRevocationProofContext, Error> {
        let p = G1Projective::generator();
        let k = pedersen_base();
        let acc = G1Projective::from(accum.0);

        let r1 = random_nonce(&mut rng);
        let delta = r1 * witness.d;
        let delta_inv = Option::<Scalar>::from(delta.invert())
            .ok_or_else(|| err_msg!(InvalidWitness, "Witness remainder is zero"))?;
        let rho = random_nonce(&mut rng);
        let rho_prime = rho * delta_inv;

        let w_prime = witness.omega * r1;
        let a_bar = LinearSum::of(&[(acc, r1), (w_prime, -element), (p, -delta)]);
        let e_d = LinearSum::of(&[(p, delta), (k, rho)]);

        let t_r1 = random_nonce(&mut rng);
        let t_delta = random_nonce(&mut rng);
        let t_rho = random_nonce(&mut rng);
        let t_delta_inv = random_nonce(&mut rng);
        let t_rho_prime = random_nonce(&mut rng);

        let t1 = LinearSum::of(&[(acc, t_r1), (w_prime, -element_blinding.0), (p, -t_delta)]);
        let t2 = LinearSum::of(&[(p, t_delta), (k, t_rho)]);
        let t3 = LinearSum::of(&[(e_d, t_delta_inv), (k, -t_rho_prime)]);

        let mut affine = [G1Affine::identity(); 6];
        G1Projective::batch_normalize(&[w_prime, a_bar, e_d, t1, t2, t3], &mut affine[..]);

        Ok(NonRevocationProofContext {
            accum: accum.0,
            w_prime: affine[0],
            a_bar: affine[1],
            e_d: affine[2],
            t1: affine[3],
            t2: affine[4],
            t3: affine[5],
            secrets: [
                (r1, t_r1),
                (delta, t_delta),
                (rho, t_rho),
                (delta_inv, t_delta_inv),
                (rho_prime, t_rho_prime),
            ],
        })
    }

    /// Recompute the proof commitments against the verifier's accumulator value
    pub fn verifier(
        &self,
        accum: &Accumulator,
        element_resp: Scalar,
        challenge: ProofChallenge,
    ) -> NonRevocationVerifier<'_> {
        let c = challenge.0;
        let p = G1Projective::generator();
        let k = pedersen_base();
        let acc = G1Projective::from(accum.0);
        let e_d = G1Projective::from(self.e_d);

        let t1 = LinearSum::of(&[
            (acc, self.r1_resp),
            (self.w_prime.into(), -element_resp),
            (p, -self.delta_resp),
            (self.a_bar.into(), c),
        ]);
        let t2 = LinearSum::of(&[(p, self.delta_resp), (k, self.rho_resp), (e_d, c)]);
        let t3 = LinearSum::of(&[
            (e_d, self.delta_inv_resp),
            (k, -self.rho_prime_resp),
            (p, c),
        ]);

        let mut check = [G1Affine::identity(); 3];
        G1Projective::batch_normalize(&[t1, t2, t3], &mut check[..]);

        NonRevocationVerifier {
            proof: self,
            accum: accum.0,
            check,
        }
    }
}

impl CreateChallenge for NonRevocationProof {
    fn write_challenge_bytes(&self, writer: &mut dyn WriteBuffer) -> Result<(), Error> {
        write_points(
            writer,
            &[&self.w_prime, &self.a_bar, &self.e_d, &self.t1, &self.t2, &self.t3],
        )
    }
}

/// A non-revocation proof bound to a specific accumulator value
#[derive(Clone, Debug)]
pub struct NonRevocationVerifier<'p> {
    proof: &'p NonRevocationProof,
    accum: G1Affine,
    check: [G1Affine; 3],
}

impl NonRevocationVerifier<'_> {
    /// Check the commitments and the pairing relation for the registry key
    pub fn verify(&self, registry_key: &PublicKey) -> Result<(), Error> {
        let proof = self.proof;
        let check_commit = self.check[0].ct_eq(&proof.t1)
            & self.check[1].ct_eq(&proof.t2)
            & self.check[2].ct_eq(&proof.t3);
        let check_pair = pairing(&proof.w_prime, &registry_key.0)
            .ct_eq(&pairing(&proof.a_bar, &G2Affine::generator()));
        if bool::from(check_commit & check_pair) {
            Ok(())
        } else {
            Err(err_msg!(InvalidProof, "Non-revocation proof is invalid"))
        }
    }
}

impl CreateChallenge for NonRevocationVerifier<'_> {
    fn write_challenge_bytes(&self, writer: &mut dyn WriteBuffer) -> Result<(), Error> {
        let proof = self.proof;
        write_points(
            writer,
            &[
                &self.accum,
                &proof.w_prime,
                &proof.a_bar,
                &proof.e_d,
                &proof.t1,
                &proof.t2,
                &proof.t3,
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{accumulator::registry_element, keys::KeyPair, util::Nonce};
    use rand::rngs::OsRng;

    #[test]
    fn prove_non_revoked() {
        let key = KeyPair::random_with_rng(OsRng);
        let revoked = [registry_element("reg", 1), registry_element("reg", 2)];
        let element = registry_element("reg", 3);
        let accum = Accumulator::from_revoked(&key, revoked).unwrap();
        let witness = NonMembershipWitness::issue(&key, &accum, &element, revoked).unwrap();

        let blinding = Blinding::random_with_rng(OsRng);
        let nonce = Nonce::random_with_rng(OsRng);
        let context =
            NonRevocationProof::prepare_with_rng(&witness, &accum, &element, blinding, OsRng)
                .expect("Error preparing proof");
        let challenge = context.create_challenge(nonce, None).unwrap();
        let proof = context.complete(challenge).unwrap();

        // the element response normally comes from the signature proof
        let element_resp = blinding.0 - challenge.0 * element;
        let verifier = proof.verifier(&accum, element_resp, challenge);
        verifier
            .verify(key.public_key())
            .expect("Error verifying proof");
        assert_eq!(verifier.create_challenge(nonce, None).unwrap(), challenge);

        let other = accum.update(&key, &[element], &[]).unwrap();
        let verifier = proof.verifier(&other, element_resp, challenge);
        assert!(verifier.verify(key.public_key()).is_err());

        let verifier = proof.verifier(&accum, element_resp + Scalar::one(), challenge);
        assert!(verifier.verify(key.public_key()).is_err());
    }
}
