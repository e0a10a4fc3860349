//! Holder commitments to hidden messages, used to request a blind signature
//!
//! The commitment is `h0 * s' + sum(h_i * m_i)` over the committed slots. The proof
//! of knowledge opens it to the challenge with responses `s~ + c * s'` and
//! `m~_i + c * m_i`.

use alloc::vec::Vec;

use bls12_381::{G1Affine, G1Projective, Scalar};
use group::Curve;
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    buffer::WriteBuffer,
    challenge::{CreateChallenge, ProofChallenge},
    error::Error,
    generators::Generators,
    signature::Message,
    util::{random_nonce, LinearSum, Nonce},
};

#[cfg(feature = "getrandom")]
use crate::util::default_rng;

/// The blinding factor for a commitment, kept secret by the holder
pub type Blinding = Nonce;

impl_point_type!(Commitment, G1Affine, "A Pedersen commitment to signature messages");

fn write_commitment_pair(
    writer: &mut dyn WriteBuffer,
    commitment: &G1Affine,
    t: &G1Affine,
) -> Result<(), Error> {
    writer.buffer_write(&commitment.to_uncompressed())?;
    writer.buffer_write(&t.to_uncompressed())
}

#[derive(Clone, Copy, Debug)]
struct Committed {
    base: G1Projective,
    message: Scalar,
    blinding: Scalar,
}

/// Collects the hidden messages to be committed
#[derive(Clone, Debug)]
pub struct CommitmentBuilder<'g, G: Generators> {
    entries: Vec<Committed>,
    gens: &'g G,
}

impl<'g, G: Generators> CommitmentBuilder<'g, G> {
    pub fn new(gens: &'g G) -> Self {
        Self {
            entries: Vec::new(),
            gens,
        }
    }
}

impl<G: Generators> CommitmentBuilder<'_, G> {
    /// Commit to the message at a slot with a fresh random blinding
    #[cfg(feature = "getrandom")]
    pub fn add_message(&mut self, index: usize, message: Message) -> Result<(), Error> {
        self.add_message_with(index, message, Blinding::random())
    }

    pub fn add_message_with(
        &mut self,
        index: usize,
        message: Message,
        blinding: Blinding,
    ) -> Result<(), Error> {
        if index >= self.gens.message_count() {
            return Err(err_msg!(Usage, "Message index exceeds generator count"));
        }
        self.entries.push(Committed {
            base: self.gens.message(index),
            message: message.0,
            blinding: blinding.0,
        });
        Ok(())
    }

    pub fn prepare_with_rng(
        self,
        mut rng: impl CryptoRng + Rng,
    ) -> Result<CommitmentProofContext, Error> {
        if self.entries.is_empty() {
            return Err(err_msg!(Usage, "No messages provided for commitment"));
        }
        let s_prime = random_nonce(&mut rng);
        let s_blind = random_nonce(&mut rng);
        let h0 = self.gens.blinding();

        let mut commitment = LinearSum::new();
        let mut t = LinearSum::new();
        for entry in &self.entries {
            commitment.add_term(entry.base, entry.message);
            t.add_term(entry.base, entry.blinding);
        }
        let mut points = [G1Affine::identity(); 2];
        G1Projective::batch_normalize(
            &[commitment.total_with(h0, s_prime), t.total_with(h0, s_blind)],
            &mut points,
        );

        Ok(CommitmentProofContext {
            commitment: Commitment(points[0]),
            t: points[1],
            entries: self.entries,
            s_prime,
            s_blind,
        })
    }

    /// Commit and prove knowledge of the committed values in one step
    #[cfg(feature = "getrandom")]
    pub fn complete(
        self,
        nonce: Nonce,
    ) -> Result<(ProofChallenge, Blinding, Commitment, CommitmentProof), Error> {
        self.complete_with_rng(default_rng(), nonce)
    }

    pub fn complete_with_rng(
        self,
        rng: impl CryptoRng + Rng,
        nonce: Nonce,
    ) -> Result<(ProofChallenge, Blinding, Commitment, CommitmentProof), Error> {
        let context = self.prepare_with_rng(rng)?;
        let challenge = context.create_challenge(nonce, None)?;
        let (blinding, commitment, proof) = context.complete(challenge)?;
        Ok((challenge, blinding, commitment, proof))
    }
}

/// A prepared commitment awaiting its challenge
#[derive(Clone, Debug)]
pub struct CommitmentProofContext {
    commitment: Commitment,
    t: G1Affine,
    entries: Vec<Committed>,
    s_prime: Scalar,
    s_blind: Scalar,
}

impl CommitmentProofContext {
    pub fn complete(
        &self,
        challenge: ProofChallenge,
    ) -> Result<(Blinding, Commitment, CommitmentProof), Error> {
        let c = challenge.0;
        let resp = core::iter::once(self.s_blind + c * self.s_prime)
            .chain(self.entries.iter().map(|e| e.blinding + c * e.message))
            .collect();
        Ok((Nonce(self.s_prime), self.commitment, CommitmentProof { resp }))
    }
}

impl CreateChallenge for CommitmentProofContext {
    fn write_challenge_bytes(&self, writer: &mut dyn WriteBuffer) -> Result<(), Error> {
        write_commitment_pair(writer, &self.commitment.0, &self.t)
    }
}

/// Proof of knowledge of the opening of a [`Commitment`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitmentProof {
    #[serde(with = "crate::serde_utils::as_hex_vec")]
    pub(crate) resp: Vec<Scalar>,
}

impl CommitmentProof {
    /// Check the proof against a commitment to the given message slots
    pub fn verify<G, I>(
        &self,
        gens: &G,
        commitment: Commitment,
        committed_indices: I,
        challenge: ProofChallenge,
        nonce: Nonce,
    ) -> Result<(), Error>
    where
        G: Generators,
        I: IntoIterator<Item = usize>,
    {
        let verifier = self.verifier(gens, commitment, committed_indices, challenge)?;
        if verifier.create_challenge(nonce, None)? == challenge {
            Ok(())
        } else {
            Err(err_msg!(InvalidProof, "Commitment proof challenge mismatch"))
        }
    }

    /// Recompute the prover's commitment from the responses
    pub fn verifier<G, I>(
        &self,
        gens: &G,
        commitment: Commitment,
        committed_indices: I,
        challenge: ProofChallenge,
    ) -> Result<CommitmentProofVerifier, Error>
    where
        G: Generators,
        I: IntoIterator<Item = usize>,
    {
        let (s_resp, m_resps) = self
            .resp
            .split_first()
            .ok_or_else(|| err_msg!(InvalidProof, "Invalid proof response count"))?;
        let mut t = LinearSum::new();
        t.add_terms(&[
            (commitment.0.into(), -challenge.0),
            (gens.blinding(), *s_resp),
        ]);
        let mut indices = committed_indices.into_iter();
        for m_resp in m_resps {
            let index = indices
                .next()
                .ok_or_else(|| err_msg!(InvalidProof, "Invalid proof response count"))?;
            if index >= gens.message_count() {
                return Err(err_msg!(InvalidProof, "Message index exceeds generator count"));
            }
            t.add_term(gens.message(index), *m_resp);
        }
        if indices.next().is_some() {
            return Err(err_msg!(InvalidProof, "Invalid proof response count"));
        }
        Ok(CommitmentProofVerifier {
            commitment: commitment.0,
            t: t.total().to_affine(),
        })
    }
}

/// The verifier's side of a commitment proof, contributing to the challenge
#[derive(Clone, Debug)]
pub struct CommitmentProofVerifier {
    commitment: G1Affine,
    t: G1Affine,
}

impl CreateChallenge for CommitmentProofVerifier {
    fn write_challenge_bytes(&self, writer: &mut dyn WriteBuffer) -> Result<(), Error> {
        write_commitment_pair(writer, &self.commitment, &self.t)
    }
}
