pub mod helpers;
pub mod issuer;
pub mod prover;
pub mod registry;
pub mod tails;
pub mod types;
pub mod verifier;

/// Domain separation tag for the aggregated presentation challenge
pub(crate) const PRESENTATION_DST: &[u8] = b"ANONCREDS_PRESENTATION_V1";
