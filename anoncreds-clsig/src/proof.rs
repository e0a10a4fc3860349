//! Zero-knowledge proofs of knowledge of a BBS+ signature
//!
//! The holder randomizes the signature as `A' = A * r1`, `Ā = B * r1 - A' * e` and
//! `D = B * r1 - h0 * r2`, then proves knowledge of `e`, `r2`, `r3 = 1 / r1`, `s'`
//! and the hidden messages. Hidden message responses take the form
//! `m~ - c * m`, so a caller-chosen blinding links them to other proofs.

use alloc::vec::Vec;

use bls12_381::{pairing, G1Affine, G1Projective, G2Affine, Scalar};
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{
    buffer::WriteBuffer,
    challenge::{CreateChallenge, ProofChallenge},
    commitment::Blinding,
    error::Error,
    generators::Generators,
    keys::PublicKey,
    signature::{Message, Signature},
    util::{random_nonce, LinearSum},
};

fn next_slot<G: Generators>(gens: &G, used: &mut usize, count: usize) -> Result<usize, Error> {
    let start = *used;
    match start.checked_add(count) {
        Some(end) if end <= gens.message_count() => {
            *used = end;
            Ok(start)
        }
        _ => Err(err_msg!(Usage, "Message index exceeds generator count")),
    }
}

fn require_all_slots<G: Generators>(gens: &G, used: usize) -> Result<(), Error> {
    if used == gens.message_count() {
        Ok(())
    } else {
        Err(err_msg!(Usage, "Message count does not match generator count"))
    }
}

#[derive(Clone, Copy, Debug)]
struct HiddenMessage {
    base: G1Projective,
    value: Scalar,
    blinding: Scalar,
}

/// The holder's view of the signed messages, in slot order
#[derive(Clone, Debug)]
pub struct ProverMessages<'g, G: Generators> {
    gens: &'g G,
    signed: LinearSum,
    hidden: Vec<HiddenMessage>,
    used: usize,
}

impl<'g, G: Generators> ProverMessages<'g, G> {
    pub fn new(gens: &'g G) -> Self {
        Self {
            gens,
            signed: LinearSum::starting_at(G1Projective::generator()),
            hidden: Vec::new(),
            used: 0,
        }
    }
}

impl<G: Generators> ProverMessages<'_, G> {
    pub fn push_revealed(&mut self, message: Message) -> Result<(), Error> {
        let slot = next_slot(self.gens, &mut self.used, 1)?;
        self.signed.add_term(self.gens.message(slot), message.0);
        Ok(())
    }

    /// Hide a message, using the given blinding for its response
    pub fn push_hidden_with(&mut self, message: Message, blinding: Blinding) -> Result<(), Error> {
        let slot = next_slot(self.gens, &mut self.used, 1)?;
        let base = self.gens.message(slot);
        self.signed.add_term(base, message.0);
        self.hidden.push(HiddenMessage {
            base,
            value: message.0,
            blinding: blinding.0,
        });
        Ok(())
    }

    /// Randomize the signature and commit to the proof blindings
    pub fn prepare_with_rng(
        &self,
        signature: &Signature,
        mut rng: impl CryptoRng + Rng,
    ) -> Result<SignatureProofContext, Error> {
        require_all_slots(self.gens, self.used)?;
        let h0 = self.gens.blinding();
        let b = self.signed.total_with(h0, signature.s);

        let r1 = random_nonce(&mut rng);
        let r2 = random_nonce(&mut rng);
        let r3 = Option::<Scalar>::from(r1.invert())
            .ok_or_else(|| err_msg!(Unexpected, "Invalid proof randomness"))?;
        let blind = ProofScalars {
            e: random_nonce(&mut rng),
            r2: random_nonce(&mut rng),
            r3: random_nonce(&mut rng),
            s: random_nonce(&mut rng),
        };
        let secrets = ProofScalars {
            e: signature.e,
            r2,
            r3,
            s: signature.s - r2 * r3,
        };

        let b_r1 = b * r1;
        let a_prime = signature.a * r1;
        let a_bar = b_r1 - a_prime * signature.e;
        let d = b_r1 - h0 * r2;
        let t1 = LinearSum::of(&[(a_prime, blind.e), (h0, blind.r2)]);
        let mut t2 = LinearSum::new();
        t2.add_terms(&[(d, blind.r3), (h0, blind.s)]);
        for msg in &self.hidden {
            t2.add_term(msg.base, msg.blinding);
        }

        let mut points = [G1Affine::identity(); 5];
        G1Projective::batch_normalize(&[a_prime, a_bar, d, t1, t2.total()], &mut points);
        let [a_prime, a_bar, d, t1, t2] = points;

        Ok(SignatureProofContext {
            values: ChallengeValues {
                a_prime,
                a_bar,
                d,
                t1,
                t2,
            },
            secrets,
            blind,
            hidden: self.hidden.iter().map(|m| (m.value, m.blinding)).collect(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct ProofScalars {
    #[serde(with = "crate::serde_utils::as_hex")]
    e: Scalar,
    #[serde(with = "crate::serde_utils::as_hex")]
    r2: Scalar,
    #[serde(with = "crate::serde_utils::as_hex")]
    r3: Scalar,
    #[serde(with = "crate::serde_utils::as_hex")]
    s: Scalar,
}

/// A signature proof awaiting its challenge
#[derive(Clone, Debug)]
pub struct SignatureProofContext {
    values: ChallengeValues,
    secrets: ProofScalars,
    blind: ProofScalars,
    hidden: Vec<(Scalar, Scalar)>,
}

impl SignatureProofContext {
    pub fn complete(&self, challenge: ProofChallenge) -> Result<SignatureProof, Error> {
        let c = challenge.0;
        let Self { secrets, blind, .. } = self;
        Ok(SignatureProof {
            values: self.values,
            resp: ProofScalars {
                e: blind.e + c * secrets.e,
                r2: blind.r2 - c * secrets.r2,
                r3: blind.r3 + c * secrets.r3,
                s: blind.s - c * secrets.s,
            },
            m_resp: self
                .hidden
                .iter()
                .map(|(value, blinding)| blinding - c * value)
                .collect(),
        })
    }

    pub fn challenge_values(&self) -> &ChallengeValues {
        &self.values
    }
}

impl CreateChallenge for SignatureProofContext {
    fn write_challenge_bytes(&self, writer: &mut dyn WriteBuffer) -> Result<(), Error> {
        self.values.write_challenge_bytes(writer)
    }
}

/// The public points of a signature proof that feed the challenge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeValues {
    #[serde(with = "crate::serde_utils::as_hex")]
    a_prime: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    a_bar: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    d: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    t1: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    t2: G1Affine,
}

impl CreateChallenge for ChallengeValues {
    fn write_challenge_bytes(&self, writer: &mut dyn WriteBuffer) -> Result<(), Error> {
        for point in [&self.a_bar, &self.a_prime, &self.t1, &self.d, &self.t2] {
            writer.buffer_write(&point.to_uncompressed())?;
        }
        Ok(())
    }
}

/// A proof of knowledge of a signature, revealing a subset of its messages
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureProof {
    #[serde(flatten)]
    values: ChallengeValues,
    #[serde(flatten)]
    resp: ProofScalars,
    #[serde(with = "crate::serde_utils::as_hex_vec")]
    m_resp: Vec<Scalar>,
}

impl SignatureProof {
    /// Recompute the blinding commitments for the challenge and compare them with
    /// the values in the proof. The caller must still compare the challenge itself.
    pub fn verify<G: Generators>(
        &self,
        public_key: &PublicKey,
        messages: &VerifierMessages<G>,
        challenge: ProofChallenge,
    ) -> Result<bool, Error> {
        if messages.hidden.len() != self.m_resp.len() {
            return Err(err_msg!(
                InvalidProof,
                "Number of hidden messages does not correspond with responses"
            ));
        }
        require_all_slots(messages.gens, messages.used)?;
        let c = challenge.0;
        let ChallengeValues {
            a_prime,
            a_bar,
            d,
            t1,
            t2,
        } = self.values;
        let h0 = messages.gens.blinding();

        let check_t1 = LinearSum::of(&[
            (a_prime.into(), self.resp.e),
            (h0, self.resp.r2),
            (G1Projective::from(a_bar) - d, c),
        ]);
        let mut check_t2 = LinearSum::new();
        check_t2.add_terms(&[
            (d.into(), self.resp.r3),
            (h0, self.resp.s),
            (messages.revealed.total(), -c),
        ]);
        for (slot, resp) in messages.hidden.iter().zip(&self.m_resp) {
            check_t2.add_term(messages.gens.message(*slot), *resp);
        }

        let mut check = [G1Affine::identity(); 2];
        G1Projective::batch_normalize(&[check_t1, check_t2.total()], &mut check);
        let pairing_ok =
            pairing(&a_prime, &public_key.0).ct_eq(&pairing(&a_bar, &G2Affine::generator()));
        let valid = !a_prime.is_identity() & check[0].ct_eq(&t1) & check[1].ct_eq(&t2) & pairing_ok;
        Ok(valid.into())
    }

    /// The response for the hidden message in the given slot
    pub fn hidden_response<G: Generators>(
        &self,
        messages: &VerifierMessages<G>,
        index: usize,
    ) -> Option<Scalar> {
        let pos = messages.hidden.iter().position(|slot| *slot == index)?;
        self.m_resp.get(pos).copied()
    }

    pub fn challenge_values(&self) -> &ChallengeValues {
        &self.values
    }
}

impl CreateChallenge for SignatureProof {
    fn write_challenge_bytes(&self, writer: &mut dyn WriteBuffer) -> Result<(), Error> {
        self.values.write_challenge_bytes(writer)
    }
}

/// The verifier's view of the signed messages, in slot order
#[derive(Clone, Debug)]
pub struct VerifierMessages<'g, G: Generators> {
    gens: &'g G,
    revealed: LinearSum,
    hidden: Vec<usize>,
    used: usize,
}

impl<'g, G: Generators> VerifierMessages<'g, G> {
    pub fn new(gens: &'g G) -> Self {
        Self {
            gens,
            revealed: LinearSum::starting_at(G1Projective::generator()),
            hidden: Vec::new(),
            used: 0,
        }
    }
}

impl<G: Generators> VerifierMessages<'_, G> {
    pub fn push_revealed(&mut self, message: Message) -> Result<(), Error> {
        let slot = next_slot(self.gens, &mut self.used, 1)?;
        self.revealed.add_term(self.gens.message(slot), message.0);
        Ok(())
    }

    /// Mark the next `count` slots as hidden
    pub fn push_hidden_count(&mut self, count: usize) -> Result<(), Error> {
        let start = next_slot(self.gens, &mut self.used, count)?;
        self.hidden.extend(start..start + count);
        Ok(())
    }
}
