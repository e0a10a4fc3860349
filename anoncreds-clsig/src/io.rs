//! Support for reading and writing structures as bytes

use core::{convert::TryFrom, fmt::Debug};

use bls12_381::{G1Affine, G2Affine, Scalar};

use crate::{buffer::WriteBuffer, error::Error};

/// Convert to and from a fixed-length byte array
pub trait FixedLengthBytes: Sized {
    /// The length of the byte array
    const LENGTH: usize;

    /// The type of the byte array
    type Buffer: AsRef<[u8]> + Clone + Copy + Debug + for<'a> TryFrom<&'a [u8]>;

    /// Work with a reference to the byte array
    fn with_bytes<R>(&self, f: impl FnOnce(&Self::Buffer) -> R) -> R;

    /// Convert from a byte array
    fn from_bytes(buf: &Self::Buffer) -> Result<Self, Error>;

    /// Convert from a byte slice, checking the length
    fn from_slice(buf: &[u8]) -> Result<Self, Error> {
        let arr = Self::Buffer::try_from(buf)
            .map_err(|_| err_msg!(InvalidEncoding, "Invalid length for fixed-length value"))?;
        Self::from_bytes(&arr)
    }

    /// Write the byte array to a target
    fn write_bytes(&self, buf: &mut dyn WriteBuffer) -> Result<(), Error> {
        self.with_bytes(|b| buf.buffer_write(b.as_ref()))
    }
}

impl FixedLengthBytes for Scalar {
    const LENGTH: usize = 32;

    type Buffer = [u8; 32];

    fn from_bytes(buf: &Self::Buffer) -> Result<Self, Error> {
        let mut b = *buf;
        b.reverse(); // into little-endian
        if let Some(s) = Scalar::from_bytes(&b).into() {
            Ok(s)
        } else {
            Err(err_msg!(InvalidEncoding, "Scalar bytes not in canonical format"))
        }
    }

    fn with_bytes<R>(&self, f: impl FnOnce(&Self::Buffer) -> R) -> R {
        let mut b = self.to_bytes();
        b.reverse(); // into big-endian
        f(&b)
    }
}

impl FixedLengthBytes for G1Affine {
    const LENGTH: usize = 48;

    type Buffer = [u8; 48];

    fn from_bytes(buf: &Self::Buffer) -> Result<Self, Error> {
        if let Some(pt) = G1Affine::from_compressed(buf).into() {
            Ok(pt)
        } else {
            Err(err_msg!(InvalidEncoding, "Invalid G1 point encoding"))
        }
    }

    fn with_bytes<R>(&self, f: impl FnOnce(&Self::Buffer) -> R) -> R {
        f(&self.to_compressed())
    }
}

impl FixedLengthBytes for G2Affine {
    const LENGTH: usize = 96;

    type Buffer = [u8; 96];

    fn from_bytes(buf: &Self::Buffer) -> Result<Self, Error> {
        if let Some(pt) = G2Affine::from_compressed(buf).into() {
            Ok(pt)
        } else {
            Err(err_msg!(InvalidEncoding, "Invalid G2 point encoding"))
        }
    }

    fn with_bytes<R>(&self, f: impl FnOnce(&Self::Buffer) -> R) -> R {
        f(&self.to_compressed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use group::Curve;

    #[test]
    fn scalar_big_endian() {
        let s = Scalar::from(258u64);
        s.with_bytes(|b| {
            assert_eq!(&b[30..], &[1u8, 2u8][..]);
            assert_eq!(<Scalar as FixedLengthBytes>::from_bytes(b).unwrap(), s);
        });
        assert!(<Scalar as FixedLengthBytes>::from_slice(&[0u8; 31]).is_err());
    }

    #[test]
    fn point_encoding() {
        let pt = (bls12_381::G1Projective::generator() * Scalar::from(5u64)).to_affine();
        let back = pt.with_bytes(|b| G1Affine::from_slice(&b[..])).unwrap();
        assert_eq!(pt, back);
        assert!(G1Affine::from_slice(&[1u8; 48]).is_err());
    }
}
