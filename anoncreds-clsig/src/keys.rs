//! BLS12-381 key pairs with public keys in G2

use core::fmt::{self, Debug, Formatter};

use bls12_381::{G2Affine, G2Projective, Scalar};
use ff::Field;
use group::Curve;
use rand::{CryptoRng, Rng};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{error::Error, io::FixedLengthBytes, util::random_nonce};

#[cfg(feature = "getrandom")]
use crate::util::default_rng;

impl_point_type!(PublicKey, G2Affine, "A public key in G2");

/// A secret scalar key
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(pub(crate) Scalar);

impl SecretKey {
    /// Load a secret key from its big-endian byte representation
    pub fn from_bytes(buf: &[u8]) -> Result<Self, Error> {
        let sk = Scalar::from_slice(buf)?;
        if bool::from(sk.is_zero()) {
            return Err(err_msg!(Usage, "Secret key must be non-zero"));
        }
        Ok(Self(sk))
    }

    /// Accessor for the secret scalar value
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretKey").field(&"<secret>").finish()
    }
}

impl serde::Serialize for SecretKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        crate::serde_utils::as_hex::serialize(&self.0, serializer)
    }
}

impl<'de> serde::Deserialize<'de> for SecretKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let sk: Scalar = crate::serde_utils::as_hex::deserialize(deserializer)?;
        Ok(Self(sk))
    }
}

/// A key pair with an optional secret component
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPair {
    secret: Option<SecretKey>,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    #[cfg(feature = "getrandom")]
    pub fn random() -> Self {
        Self::random_with_rng(default_rng())
    }

    /// Generate a new random key pair from a specific RNG
    pub fn random_with_rng(rng: impl CryptoRng + Rng) -> Self {
        Self::from_secret_key(SecretKey(random_nonce(rng)))
    }

    /// Derive the key pair for a secret key
    pub fn from_secret_key(sk: SecretKey) -> Self {
        let public = PublicKey((G2Projective::generator() * sk.0).to_affine());
        Self {
            secret: Some(sk),
            public,
        }
    }

    /// Load a key pair from big-endian secret key bytes
    pub fn from_secret_bytes(buf: &[u8]) -> Result<Self, Error> {
        Ok(Self::from_secret_key(SecretKey::from_bytes(buf)?))
    }

    /// Create a verification-only key pair
    pub fn from_public_key(public: PublicKey) -> Self {
        Self {
            secret: None,
            public,
        }
    }

    /// Accessor for the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Accessor for the secret key, if any
    pub fn secret_key(&self) -> Option<&SecretKey> {
        self.secret.as_ref()
    }

    /// Accessor for the secret scalar, failing when only the public key is present
    pub(crate) fn secret_scalar(&self) -> Result<&Scalar, Error> {
        self.secret
            .as_ref()
            .map(|sk| &sk.0)
            .ok_or_else(|| err_msg!(MissingSecretKey))
    }
}
