use core::fmt::{self, Display, Formatter};

/// Failure categories for the signature, accumulator and proof primitives
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bytes or a hex string did not decode to a valid value
    InvalidEncoding,
    /// A zero-knowledge proof was rejected
    InvalidProof,
    /// A signature was rejected
    InvalidSignature,
    /// A non-membership witness does not open the accumulator
    InvalidWitness,
    /// The operation needs a secret key that the key pair lacks
    MissingSecretKey,
    Unexpected,
    Unsupported,
    /// The primitive was driven with inconsistent inputs
    Usage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidEncoding => "Invalid encoding",
            Self::InvalidProof => "Invalid proof",
            Self::InvalidSignature => "Invalid signature",
            Self::InvalidWitness => "Invalid witness",
            Self::MissingSecretKey => "Missing secret key",
            Self::Unexpected => "Unexpected error",
            Self::Unsupported => "Unsupported",
            Self::Usage => "Usage error",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An allocation-free error carrying a static description
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

impl Error {
    pub fn from_msg(kind: ErrorKind, msg: &'static str) -> Self {
        Self { kind, message: msg }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The description of the failure, defaulting to the kind description
    pub fn message(&self) -> &'static str {
        self.message
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::from_msg(kind, kind.as_str())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.message == self.kind.as_str() {
            f.write_str(self.message)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

macro_rules! err_msg {
    ($kind:ident) => {
        $crate::error::Error::from($crate::error::ErrorKind::$kind)
    };
    ($kind:ident, $msg:expr) => {
        $crate::error::Error::from_msg($crate::error::ErrorKind::$kind, $msg)
    };
}
