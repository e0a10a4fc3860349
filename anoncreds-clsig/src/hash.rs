//! Hashing of arbitrary input into scalars with SHAKE-256

use core::fmt::{self, Debug, Formatter};

use bls12_381::Scalar;
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256, Shake256Reader,
};

use crate::{buffer::WriteBuffer, error::Error};

/// Absorbs input and squeezes out scalars. The optional domain separation tag
/// is absorbed last.
#[derive(Clone)]
pub struct HashScalar<'d> {
    xof: Shake256,
    dst: Option<&'d [u8]>,
}

impl<'d> HashScalar<'d> {
    pub fn new(dst: Option<&'d [u8]>) -> Self {
        Self {
            xof: Shake256::default(),
            dst,
        }
    }

    /// Hash one input to a single scalar
    pub fn digest(input: impl AsRef<[u8]>, dst: Option<&'d [u8]>) -> Scalar {
        let mut hasher = Self::new(dst);
        hasher.update(input);
        hasher.finalize().next()
    }

    #[inline]
    pub fn update(&mut self, input: impl AsRef<[u8]>) {
        self.xof.update(input.as_ref());
    }

    pub fn finalize(self) -> HashScalarRead {
        let Self { mut xof, dst } = self;
        if let Some(dst) = dst {
            xof.update(dst);
        }
        HashScalarRead(xof.finalize_xof())
    }
}

impl Debug for HashScalar<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashScalar").field("dst", &self.dst).finish()
    }
}

impl WriteBuffer for HashScalar<'_> {
    fn buffer_write(&mut self, data: &[u8]) -> Result<(), Error> {
        self.update(data);
        Ok(())
    }
}

/// The squeezing side of a finalized [`HashScalar`]
pub struct HashScalarRead(Shake256Reader);

impl HashScalarRead {
    /// Reduce the next 64 output bytes to a scalar
    pub fn next(&mut self) -> Scalar {
        let mut wide = [0u8; 64];
        self.0.read(&mut wide);
        Scalar::from_bytes_wide(&wide)
    }
}

impl Debug for HashScalarRead {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("HashScalarRead")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_matches_incremental() {
        let mut state = HashScalar::new(Some(b"dst"));
        state.update(b"hello ");
        state.update(b"world");
        assert_eq!(
            state.finalize().next(),
            HashScalar::digest(b"hello world", Some(b"dst"))
        );
        assert_ne!(
            HashScalar::digest(b"hello world", None),
            HashScalar::digest(b"hello world", Some(b"dst"))
        );
    }

    #[test]
    fn reader_continues() {
        let mut read = HashScalar::new(None).finalize();
        let first = read.next();
        assert_ne!(first, read.next());
    }
}
