//! Anonymous credentials: issuer key setup, blind issuance, accumulator-based revocation,
//! zero-knowledge presentations and their verification.
//!
//! Every public entity has a canonical JSON form (see [`data_types`]). The operations in
//! [`issuer`], [`prover`] and [`verifier`] are pure functions over these values, apart from
//! tails file access and the optional [`registry::RegistryAllocator`].

#[macro_use]
mod error;
pub use self::error::{Error, ErrorKind, Result};

#[macro_use]
extern crate log;

#[macro_use]
mod serde_utils;

pub mod data_types;

#[cfg(feature = "logger")]
mod logger;
#[cfg(feature = "logger")]
pub use self::logger::set_default_logger;

pub mod query;

mod services;
pub use self::services::{helpers, issuer, prover, registry, tails, types, verifier};

/// The version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
