use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use anoncreds_clsig::{bls12_381::Scalar, Nonce as NativeNonce};
use num_bigint::BigUint;
use rand::{rngs::OsRng, RngCore};

use crate::{
    error::{Error, Result},
    helpers::scalar_from_decimal,
};

const NONCE_BYTES: usize = 10;

/// A decimal nonce value shared between protocol participants
#[derive(Clone, PartialEq, Eq)]
pub struct Nonce {
    strval: String,
    native: Scalar,
}

impl Nonce {
    /// Generate a new random 80-bit nonce
    pub fn new() -> Result<Self> {
        let mut buf = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut buf);
        Self::from_dec(BigUint::from_bytes_be(&buf).to_string())
    }

    /// Parse a nonce from its decimal representation
    pub fn from_dec(value: impl Into<String>) -> Result<Self> {
        let strval = value.into();
        if strval.is_empty() || !strval.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err_msg!("Invalid nonce: must be a decimal string"));
        }
        let native = scalar_from_decimal(&strval)?;
        Ok(Self { strval, native })
    }

    /// The nonce value used for proof challenges
    pub fn as_native(&self) -> NativeNonce {
        NativeNonce::from(self.native)
    }
}

impl AsRef<str> for Nonce {
    fn as_ref(&self) -> &str {
        &self.strval
    }
}

impl FromStr for Nonce {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_dec(s)
    }
}

impl Debug for Nonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Nonce").field(&self.strval).finish()
    }
}

impl Display for Nonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.strval)
    }
}

serde_as_str_impl!(Nonce);

/// Generate a new random nonce for a credential offer or presentation request
pub fn generate_nonce() -> Result<Nonce> {
    Nonce::new()
}
