use std::convert::TryFrom;
use std::fmt::{self, Debug, Formatter};

use anoncreds_clsig::{bls12_381::Scalar, random_nonce, Message};
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    error::{Error, Result},
    helpers::{scalar_from_decimal, scalar_to_decimal},
};

/// The holder secret tying credentials to a single holder
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LinkSecret(Scalar);

impl LinkSecret {
    pub fn new() -> Result<Self> {
        Ok(Self(random_nonce(OsRng)))
    }

    /// The decimal string form of the secret
    pub fn to_decimal(&self) -> String {
        scalar_to_decimal(&self.0)
    }

    pub(crate) fn as_message(&self) -> Message {
        Message::from(self.0)
    }
}

impl Debug for LinkSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LinkSecret").field(&"<secret>").finish()
    }
}

impl TryFrom<&str> for LinkSecret {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        if value.starts_with('-') {
            return Err(err_msg!("Invalid link secret"));
        }
        scalar_from_decimal(value)
            .map(Self)
            .map_err(err_map!("Invalid link secret"))
    }
}

impl TryFrom<&LinkSecret> for String {
    type Error = Error;

    fn try_from(value: &LinkSecret) -> Result<Self> {
        Ok(value.to_decimal())
    }
}
