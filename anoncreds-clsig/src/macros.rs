/// Serialize a fixed-length type as a hex string
macro_rules! impl_hex_serde {
    ($type:ty) => {
        impl serde::Serialize for $type {
            fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
                $crate::serde_utils::as_hex::serialize(self, ser)
            }
        }

        impl<'de> serde::Deserialize<'de> for $type {
            fn deserialize<D: serde::Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
                $crate::serde_utils::as_hex::deserialize(de)
            }
        }
    };
}

/// Newtype over a scalar with hex serialization and constant-time comparison
macro_rules! impl_scalar_type {
    ($type:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $type(pub(crate) bls12_381::Scalar);

        impl $type {
            pub fn as_scalar(&self) -> &bls12_381::Scalar {
                &self.0
            }
        }

        impl $crate::io::FixedLengthBytes for $type {
            const LENGTH: usize = <bls12_381::Scalar as $crate::io::FixedLengthBytes>::LENGTH;
            type Buffer = <bls12_381::Scalar as $crate::io::FixedLengthBytes>::Buffer;

            fn from_bytes(buf: &Self::Buffer) -> Result<Self, $crate::Error> {
                <bls12_381::Scalar as $crate::io::FixedLengthBytes>::from_bytes(buf).map(Self)
            }

            fn with_bytes<R>(&self, f: impl FnOnce(&Self::Buffer) -> R) -> R {
                $crate::io::FixedLengthBytes::with_bytes(&self.0, f)
            }
        }

        impl subtle::ConstantTimeEq for $type {
            fn ct_eq(&self, other: &Self) -> subtle::Choice {
                subtle::ConstantTimeEq::ct_eq(&self.0, &other.0)
            }
        }

        impl From<bls12_381::Scalar> for $type {
            fn from(value: bls12_381::Scalar) -> Self {
                Self(value)
            }
        }

        impl From<&bls12_381::Scalar> for $type {
            fn from(value: &bls12_381::Scalar) -> Self {
                Self(*value)
            }
        }

        impl From<u64> for $type {
            fn from(value: u64) -> Self {
                Self(value.into())
            }
        }

        impl_hex_serde!($type);
    };
}

/// Newtype over a curve point with hex serialization
macro_rules! impl_point_type {
    ($type:ident, $point:ty, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $type(pub(crate) $point);

        impl $type {
            pub fn as_point(&self) -> &$point {
                &self.0
            }
        }

        impl $crate::io::FixedLengthBytes for $type {
            const LENGTH: usize = <$point as $crate::io::FixedLengthBytes>::LENGTH;
            type Buffer = <$point as $crate::io::FixedLengthBytes>::Buffer;

            fn from_bytes(buf: &Self::Buffer) -> Result<Self, $crate::Error> {
                <$point as $crate::io::FixedLengthBytes>::from_bytes(buf).map(Self)
            }

            fn with_bytes<R>(&self, f: impl FnOnce(&Self::Buffer) -> R) -> R {
                $crate::io::FixedLengthBytes::with_bytes(&self.0, f)
            }
        }

        impl From<$point> for $type {
            fn from(value: $point) -> Self {
                Self(value)
            }
        }

        impl_hex_serde!($type);
    };
}
