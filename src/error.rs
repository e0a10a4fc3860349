use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use anoncreds_clsig::{Error as CryptoError, ErrorKind as CryptoErrorKind};

/// The possible kinds of error produced by the crate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input parameters to the method were incorrect
    Input,

    /// A schema has no attributes or duplicate attribute names
    InvalidSchema,

    /// A key correctness proof does not match the credential definition
    KeyMismatch,

    /// A credential offer is missing required values
    MalformedOffer,

    /// Credential values do not match the credential definition attributes
    UnknownAttribute,

    /// A revocation registry index exceeds the registry capacity
    RegistryFull,

    /// The credential definition supports revocation but no registry was provided
    RevocationConfigRequired,

    /// A registry was provided for a credential definition without revocation support
    RevocationNotSupported,

    /// A credential signature failed verification
    SignatureInvalid,

    /// A non-revocation witness failed verification
    WitnessInvalid,

    /// A revocation registry index is outside of the registry
    IndexOutOfRange,

    /// A status list timestamp does not follow the previous one
    NonMonotonicTimestamp,

    /// The operation is not possible in the current revocation state
    InvalidState,

    /// A requested referent is not resolved by the provided credentials
    UnresolvedReferent,

    /// A presentation failed verification
    VerificationFailed,

    /// An error reading or writing a file
    IOError,

    /// An unexpected error occurred
    Unexpected,

    /// An unsupported operation was requested
    Unsupported,
}

impl ErrorKind {
    /// Convert the error kind to a string reference
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "Input error",
            Self::InvalidSchema => "Invalid schema",
            Self::KeyMismatch => "Key correctness proof mismatch",
            Self::MalformedOffer => "Malformed credential offer",
            Self::UnknownAttribute => "Unknown attribute",
            Self::RegistryFull => "Revocation registry is full",
            Self::RevocationConfigRequired => "Revocation configuration required",
            Self::RevocationNotSupported => "Revocation not supported",
            Self::SignatureInvalid => "Invalid signature",
            Self::WitnessInvalid => "Invalid witness",
            Self::IndexOutOfRange => "Index out of range",
            Self::NonMonotonicTimestamp => "Non-monotonic timestamp",
            Self::InvalidState => "Invalid state",
            Self::UnresolvedReferent => "Unresolved referent",
            Self::VerificationFailed => "Verification failed",
            Self::IOError => "IO error",
            Self::Unexpected => "Unexpected error",
            Self::Unsupported => "Unsupported",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The standard crate error type
#[derive(Debug)]
pub struct Error {
    pub(crate) kind: ErrorKind,
    pub(crate) cause: Option<Box<dyn StdError + Send + Sync + 'static>>,
    pub(crate) message: Option<String>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn from_msg<T: Into<String>>(kind: ErrorKind, msg: T) -> Self {
        Self {
            kind,
            cause: None,
            message: Some(msg.into()),
        }
    }

    /// Accessor for the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Accessor for the error message
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub(crate) fn with_cause<T: Into<Box<dyn StdError + Send + Sync + 'static>>>(
        mut self,
        err: T,
    ) -> Self {
        self.cause = Some(err.into());
        self
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(msg) = self.message.as_ref() {
            f.write_str(msg)?;
        } else {
            f.write_str(self.kind.as_str())?;
        }
        if let Some(cause) = self.cause.as_ref() {
            write!(f, "\nCaused by: {}", cause)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            cause: None,
            message: None,
        }
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        let kind = match err.kind() {
            CryptoErrorKind::InvalidEncoding
            | CryptoErrorKind::MissingSecretKey
            | CryptoErrorKind::Usage => ErrorKind::Input,
            CryptoErrorKind::InvalidProof => ErrorKind::VerificationFailed,
            CryptoErrorKind::InvalidSignature => ErrorKind::SignatureInvalid,
            CryptoErrorKind::InvalidWitness => ErrorKind::WitnessInvalid,
            CryptoErrorKind::Unexpected => ErrorKind::Unexpected,
            CryptoErrorKind::Unsupported => ErrorKind::Unsupported,
        };
        Error::from_msg(kind, err.message())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::from_msg(ErrorKind::Input, "Invalid JSON").with_cause(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::from(ErrorKind::IOError).with_cause(err)
    }
}

macro_rules! err_msg {
    () => {
        $crate::error::Error::from($crate::error::ErrorKind::Input)
    };
    ($kind:ident) => {
        $crate::error::Error::from($crate::error::ErrorKind::$kind)
    };
    ($kind:ident, $($args:tt)+) => {
        $crate::error::Error::from_msg($crate::error::ErrorKind::$kind, format!($($args)+))
    };
    ($($args:tt)+) => {
        $crate::error::Error::from_msg($crate::error::ErrorKind::Input, format!($($args)+))
    };
}

macro_rules! err_map {
    ($($params:tt)*) => {
        |err| err_msg!($($params)*).with_cause(err)
    };
}
