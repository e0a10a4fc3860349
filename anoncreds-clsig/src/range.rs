//! Zero-knowledge range proofs for integer predicates over hidden signed messages
//!
//! The message is committed as `m * P + r * K`. The difference between the message
//! and the predicate bound is decomposed into 32 committed bits, each with an OR proof
//! that it commits to zero or one. The message blinding is shared with the signature
//! proof.

use alloc::vec::Vec;

use bls12_381::{G1Affine, G1Projective, Scalar};
use group::Curve;
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{
    buffer::WriteBuffer,
    challenge::{CreateChallenge, ProofChallenge},
    commitment::Blinding,
    error::Error,
    generators::pedersen_base,
    util::{random_nonce, scalar_from_i64, LinearSum},
};

const RANGE_BITS: usize = 32;

/// The comparison applied between a hidden message and a public bound
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PredicateType {
    #[serde(rename = ">=")]
    GE,
    #[serde(rename = "<=")]
    LE,
    #[serde(rename = ">")]
    GT,
    #[serde(rename = "<")]
    LT,
}

impl PredicateType {
    /// Check the predicate against plain values
    pub fn check(&self, value: i64, bound: i64) -> bool {
        match self {
            Self::GE => value >= bound,
            Self::LE => value <= bound,
            Self::GT => value > bound,
            Self::LT => value < bound,
        }
    }

    /// The non-negative difference proven by the range proof
    fn delta(&self, value: i64, bound: i64) -> i64 {
        match self {
            Self::GE => value - bound,
            Self::LE => bound - value,
            Self::GT => value - bound - 1,
            Self::LT => bound - value - 1,
        }
    }

    /// Derive the commitment to the difference from the message commitment
    fn delta_commitment(&self, commit_m: G1Projective, bound: i64) -> G1Projective {
        let p = G1Projective::generator();
        match self {
            Self::GE => commit_m - p * scalar_from_i64(bound),
            Self::LE => p * scalar_from_i64(bound) - commit_m,
            Self::GT => commit_m - p * scalar_from_i64(bound + 1),
            Self::LT => p * scalar_from_i64(bound - 1) - commit_m,
        }
    }

    fn negates_blinding(&self) -> bool {
        matches!(self, Self::LE | Self::LT)
    }

    fn as_byte(&self) -> u8 {
        match self {
            Self::GE => 0,
            Self::LE => 1,
            Self::GT => 2,
            Self::LT => 3,
        }
    }
}

fn write_predicate(
    writer: &mut dyn WriteBuffer,
    predicate: PredicateType,
    bound: i64,
) -> Result<(), Error> {
    writer.buffer_write(&[predicate.as_byte()])?;
    writer.buffer_write(&bound.to_be_bytes())
}

#[derive(Clone, Debug)]
struct BitContext {
    commit: G1Affine,
    t0: G1Affine,
    t1: G1Affine,
    bit: bool,
    blinding: Scalar,
    t_rand: Scalar,
    c_sim: Scalar,
    s_sim: Scalar,
}

/// A prepared range proof awaiting the aggregate challenge
#[derive(Clone, Debug)]
pub struct RangeProofContext {
    predicate: PredicateType,
    bound: i64,
    commit_m: G1Affine,
    t_m: G1Affine,
    r: Scalar,
    r_rand: Scalar,
    bits: Vec<BitContext>,
}

impl RangeProofContext {
    pub fn complete(&self, challenge: ProofChallenge) -> Result<RangeProof, Error> {
        let c = challenge.0;
        let bits = self
            .bits
            .iter()
            .map(|ctx| {
                let c_real = c - ctx.c_sim;
                let s_real = ctx.t_rand - c_real * ctx.blinding;
                let (c0, s0, s1) = if ctx.bit {
                    (ctx.c_sim, ctx.s_sim, s_real)
                } else {
                    (c_real, s_real, ctx.s_sim)
                };
                BitProof {
                    commit: ctx.commit,
                    t0: ctx.t0,
                    t1: ctx.t1,
                    c0,
                    s0,
                    s1,
                }
            })
            .collect();
        Ok(RangeProof {
            commit_m: self.commit_m,
            t_m: self.t_m,
            r_resp: self.r_rand - c * self.r,
            bits,
        })
    }
}

impl CreateChallenge for RangeProofContext {
    fn write_challenge_bytes(&self, writer: &mut dyn WriteBuffer) -> Result<(), Error> {
        write_predicate(writer, self.predicate, self.bound)?;
        writer.buffer_write(&self.commit_m.to_uncompressed())?;
        writer.buffer_write(&self.t_m.to_uncompressed())?;
        for bit in self.bits.iter() {
            writer.buffer_write(&bit.commit.to_uncompressed())?;
            writer.buffer_write(&bit.t0.to_uncompressed())?;
            writer.buffer_write(&bit.t1.to_uncompressed())?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct BitProof {
    #[serde(with = "crate::serde_utils::as_hex")]
    commit: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    t0: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    t1: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    c0: Scalar,
    #[serde(with = "crate::serde_utils::as_hex")]
    s0: Scalar,
    #[serde(with = "crate::serde_utils::as_hex")]
    s1: Scalar,
}

/// A proof that a hidden message satisfies a predicate against a public bound
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeProof {
    #[serde(with = "crate::serde_utils::as_hex")]
    commit_m: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    t_m: G1Affine,
    #[serde(with = "crate::serde_utils::as_hex")]
    r_resp: Scalar,
    bits: Vec<BitProof>,
}

impl RangeProof {
    /// Commit to the message and the bits of its difference from the bound. Fails
    /// when the predicate does not hold for the message value.
    pub fn prepare_with_rng(
        value: i64,
        predicate: PredicateType,
        bound: i64,
        m_blinding: Blinding,
        mut rng: impl CryptoRng + Rng,
    ) -> Result<RangeProofContext, Error> {
        let delta = predicate.delta(value, bound);
        if delta < 0 || delta >= (1i64 << RANGE_BITS) {
            return Err(err_msg!(Usage, "Predicate is not satisfied"));
        }
        let delta = delta as u64;

        let p = G1Projective::generator();
        let k = pedersen_base();

        let r = random_nonce(&mut rng);
        let r_rand = random_nonce(&mut rng);
        let commit_m = LinearSum::of(&[(p, scalar_from_i64(value)), (k, r)]);
        let t_m = LinearSum::of(&[(p, m_blinding.0), (k, r_rand)]);
        let r_delta = if predicate.negates_blinding() { -r } else { r };

        let mut blindings = Vec::with_capacity(RANGE_BITS);
        let mut weighted = Scalar::zero();
        let mut pow = Scalar::one();
        blindings.push(Scalar::zero());
        for _ in 1..RANGE_BITS {
            pow = pow.double();
            let r_i = random_nonce(&mut rng);
            weighted += pow * r_i;
            blindings.push(r_i);
        }
        blindings[0] = r_delta - weighted;

        let mut points = Vec::with_capacity(RANGE_BITS * 3 + 2);
        points.push(commit_m);
        points.push(t_m);
        let mut bits = Vec::with_capacity(RANGE_BITS);
        for (i, blinding) in blindings.into_iter().enumerate() {
            let bit = (delta >> i) & 1 == 1;
            let commit = k * blinding + if bit { p } else { G1Projective::identity() };
            // the simulated branch proves the opposite bit value
            let y_sim = if bit { commit } else { commit - p };
            let t_rand = random_nonce(&mut rng);
            let c_sim = random_nonce(&mut rng);
            let s_sim = random_nonce(&mut rng);
            let t_real = k * t_rand;
            let t_sim = LinearSum::of(&[(k, s_sim), (y_sim, c_sim)]);
            let (t0, t1) = if bit { (t_sim, t_real) } else { (t_real, t_sim) };
            points.extend([commit, t0, t1]);
            bits.push(BitContext {
                commit: G1Affine::identity(),
                t0: G1Affine::identity(),
                t1: G1Affine::identity(),
                bit,
                blinding,
                t_rand,
                c_sim,
                s_sim,
            });
        }

        let mut affine = alloc::vec![G1Affine::identity(); points.len()];
        G1Projective::batch_normalize(&points, &mut affine);
        for (ctx, pts) in bits.iter_mut().zip(affine[2..].chunks_exact(3)) {
            ctx.commit = pts[0];
            ctx.t0 = pts[1];
            ctx.t1 = pts[2];
        }

        Ok(RangeProofContext {
            predicate,
            bound,
            commit_m: affine[0],
            t_m: affine[1],
            r,
            r_rand,
            bits,
        })
    }

    /// Recompute the proof commitments given the signature proof response for the message
    pub fn verifier(
        &self,
        predicate: PredicateType,
        bound: i64,
        message_resp: Scalar,
        challenge: ProofChallenge,
    ) -> Result<RangeProofVerifier<'_>, Error> {
        if self.bits.len() != RANGE_BITS {
            return Err(err_msg!(InvalidProof, "Invalid range proof length"));
        }
        let c = challenge.0;
        let p = G1Projective::generator();
        let k = pedersen_base();
        let commit_m = G1Projective::from(self.commit_m);

        let mut points = Vec::with_capacity(RANGE_BITS * 2 + 1);
        points.push(LinearSum::of(&[
            (p, message_resp),
            (k, self.r_resp),
            (commit_m, c),
        ]));

        let mut sum = LinearSum::new();
        let mut pow = Scalar::one();
        for bit in self.bits.iter() {
            let y0 = G1Projective::from(bit.commit);
            let y1 = y0 - p;
            sum.add_term(y0, pow);
            pow = pow.double();
            points.push(LinearSum::of(&[(k, bit.s0), (y0, bit.c0)]));
            points.push(LinearSum::of(&[(k, bit.s1), (y1, c - bit.c0)]));
        }
        let delta_commit = predicate.delta_commitment(commit_m, bound);
        let sum_check = sum.total().to_affine().ct_eq(&delta_commit.to_affine());

        let mut check = alloc::vec![G1Affine::identity(); points.len()];
        G1Projective::batch_normalize(&points, &mut check);

        Ok(RangeProofVerifier {
            proof: self,
            predicate,
            bound,
            sum_check: sum_check.into(),
            check,
        })
    }
}

/// A range proof bound to a specific predicate and message response
#[derive(Clone, Debug)]
pub struct RangeProofVerifier<'p> {
    proof: &'p RangeProof,
    predicate: PredicateType,
    bound: i64,
    sum_check: bool,
    check: Vec<G1Affine>,
}

impl RangeProofVerifier<'_> {
    pub fn verify(&self) -> Result<(), Error> {
        let proof = self.proof;
        let mut valid = self.check[0].ct_eq(&proof.t_m);
        for (bit, pts) in proof.bits.iter().zip(self.check[1..].chunks_exact(2)) {
            valid &= pts[0].ct_eq(&bit.t0) & pts[1].ct_eq(&bit.t1);
        }
        if self.sum_check && bool::from(valid) {
            Ok(())
        } else {
            Err(err_msg!(InvalidProof, "Range proof is invalid"))
        }
    }
}

impl CreateChallenge for RangeProofVerifier<'_> {
    fn write_challenge_bytes(&self, writer: &mut dyn WriteBuffer) -> Result<(), Error> {
        let proof = self.proof;
        write_predicate(writer, self.predicate, self.bound)?;
        writer.buffer_write(&proof.commit_m.to_uncompressed())?;
        writer.buffer_write(&proof.t_m.to_uncompressed())?;
        for bit in proof.bits.iter() {
            writer.buffer_write(&bit.commit.to_uncompressed())?;
            writer.buffer_write(&bit.t0.to_uncompressed())?;
            writer.buffer_write(&bit.t1.to_uncompressed())?;
        }
        Ok(())
    }
}
