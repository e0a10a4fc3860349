//! Message generators for BBS+ signatures, derived by hashing to G1
//!
//! Generator 0 is the blinding base `h0`. Message `i` uses generator `i + 1`.

use alloc::vec::Vec;
use core::{fmt::Debug, ops::Range};

use bls12_381::{
    hash_to_curve::{ExpandMsgXmd, HashToCurve},
    G1Projective,
};

use crate::keys::PublicKey;

const GENERATOR_DST: &[u8] = b"BLS12381G1_XMD:SHA-256_SSWU_RO_ANONCREDS_BBS+_SIGNATURES:1_0_0";
const PEDERSEN_DST: &[u8] = b"BLS12381G1_XMD:SHA-256_SSWU_RO_ANONCREDS_PEDERSEN:1_0_0";
const PK_LEN: usize = 192;

fn hash_to_g1(input: &[u8], dst: &[u8]) -> G1Projective {
    <G1Projective as HashToCurve<ExpandMsgXmd<sha2::Sha256>>>::hash_to_curve(input, dst)
}

/// The generator set for one signing key and message count
pub trait Generators: Clone + Debug {
    fn generator(&self, index: usize) -> G1Projective;

    /// The number of message slots, excluding the blinding base
    fn message_count(&self) -> usize;

    #[inline]
    fn blinding(&self) -> G1Projective {
        self.generator(0)
    }

    #[inline]
    fn message(&self, index: usize) -> G1Projective {
        self.generator(index + 1)
    }

    /// Every generator, starting with the blinding base
    fn iter(&self) -> GeneratorsIter<'_, Self> {
        GeneratorsIter {
            gens: self,
            range: 0..self.message_count() + 1,
        }
    }
}

#[derive(Debug)]
pub struct GeneratorsIter<'g, G: Generators> {
    gens: &'g G,
    range: Range<usize>,
}

impl<G: Generators> Iterator for GeneratorsIter<'_, G> {
    type Item = G1Projective;

    fn next(&mut self) -> Option<G1Projective> {
        self.range.next().map(|index| self.gens.generator(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl<G: Generators> ExactSizeIterator for GeneratorsIter<'_, G> {}

/// A generator set held in memory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VecGenerators(Vec<G1Projective>);

impl Generators for VecGenerators {
    fn generator(&self, index: usize) -> G1Projective {
        self.0[index]
    }

    fn message_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }
}

impl<G: Generators> From<&G> for VecGenerators {
    fn from(gens: &G) -> Self {
        Self(gens.iter().collect())
    }
}

/// Generators hashed on demand from the issuer public key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynGenerators {
    public_key: [u8; PK_LEN],
    message_count: usize,
}

impl DynGenerators {
    pub fn new(public_key: &PublicKey, message_count: usize) -> Self {
        Self {
            public_key: public_key.0.to_uncompressed(),
            message_count,
        }
    }

    /// Compute every generator once
    pub fn to_vec(&self) -> VecGenerators {
        self.into()
    }
}

impl Generators for DynGenerators {
    fn generator(&self, index: usize) -> G1Projective {
        // public key || message count || index
        let mut input = [0u8; PK_LEN + 8];
        input[..PK_LEN].copy_from_slice(&self.public_key);
        input[PK_LEN..PK_LEN + 4].copy_from_slice(&(self.message_count as u32).to_be_bytes());
        input[PK_LEN + 4..].copy_from_slice(&(index as u32).to_be_bytes());
        hash_to_g1(&input, GENERATOR_DST)
    }

    fn message_count(&self) -> usize {
        self.message_count
    }
}

/// The second Pedersen base, with no known discrete log relative to the G1 generator
pub fn pedersen_base() -> G1Projective {
    hash_to_g1(b"anoncreds pedersen base", PEDERSEN_DST)
}
