//! Signature, accumulator and zero-knowledge proof primitives for anonymous credentials
//! on the BLS12-381 curve.
//!
//! Credentials are BBS+ signatures over a vector of scalar messages. Revocation uses a
//! pairing-based accumulator over the set of revoked elements, with non-membership
//! witnesses computed from a public tails table.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use bls12_381;

#[macro_use]
mod error;
pub use error::{Error, ErrorKind};

#[macro_use]
mod macros;

mod accumulator;
pub use accumulator::{
    registry_element, registry_id_message, Accumulator, NonMembershipWitness, Tails,
    TailsGenerator,
};

mod buffer;
pub use buffer::WriteBuffer;

mod challenge;
pub use challenge::{CreateChallenge, ProofChallenge};

mod commitment;
pub use commitment::{
    Blinding, Commitment, CommitmentBuilder, CommitmentProof, CommitmentProofContext,
};

mod correctness;
pub use correctness::KeyCorrectnessProof;

mod generators;
pub use generators::{pedersen_base, DynGenerators, Generators, VecGenerators};

pub mod hash;

pub mod io;

mod keys;
pub use keys::{KeyPair, PublicKey, SecretKey};

mod nonrevoc;
pub use nonrevoc::{NonRevocationProof, NonRevocationProofContext, NonRevocationVerifier};

mod proof;
pub use proof::{
    ChallengeValues, ProverMessages, SignatureProof, SignatureProofContext, VerifierMessages,
};

mod range;
pub use range::{PredicateType, RangeProof, RangeProofContext, RangeProofVerifier};

pub mod serde_utils;

mod signature;
pub use signature::{Message, Signature, SignatureMessages};

mod util;
pub use util::{random_nonce, scalar_from_i64, Nonce};

#[cfg(feature = "getrandom")]
pub use util::default_rng;
