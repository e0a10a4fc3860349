//! Serde helpers encoding fixed-length values as hex strings

use alloc::{string::String, vec::Vec};
use core::{fmt, marker::PhantomData};

use serde::{
    de::{SeqAccess, Visitor},
    ser::SerializeSeq,
    Deserializer, Serializer,
};

use crate::io::FixedLengthBytes;

fn decode_hex<T: FixedLengthBytes, E: serde::de::Error>(v: &str) -> Result<T, E> {
    let bytes = hex::decode(v).map_err(E::custom)?;
    T::from_slice(&bytes).map_err(|err| E::custom(err.message()))
}

/// Serialize a single value as a hex string
pub mod as_hex {
    use super::*;

    pub fn serialize<S, T>(inst: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: FixedLengthBytes,
    {
        inst.with_bytes(|b| serializer.serialize_str(&hex::encode(b)))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FixedLengthBytes,
    {
        deserializer.deserialize_str(HexVisitor { _pd: PhantomData })
    }

    struct HexVisitor<T> {
        _pd: PhantomData<T>,
    }

    impl<'de, T: FixedLengthBytes> Visitor<'de> for HexVisitor<T> {
        type Value = T;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a hex-encoded value")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            decode_hex(v)
        }
    }
}

/// Serialize a sequence of values as a list of hex strings
pub mod as_hex_vec {
    use super::*;

    pub fn serialize<S, T>(inst: &[T], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: FixedLengthBytes,
    {
        let mut seq = serializer.serialize_seq(Some(inst.len()))?;
        for item in inst {
            let enc: String = item.with_bytes(|b| hex::encode(b));
            seq.serialize_element(&enc)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FixedLengthBytes,
    {
        deserializer.deserialize_seq(HexSeqVisitor { _pd: PhantomData })
    }

    struct HexSeqVisitor<T> {
        _pd: PhantomData<T>,
    }

    impl<'de, T: FixedLengthBytes> Visitor<'de> for HexSeqVisitor<T> {
        type Value = Vec<T>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a list of hex-encoded values")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut result = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(256));
            while let Some(item) = seq.next_element::<String>()? {
                result.push(decode_hex(&item)?);
            }
            Ok(result)
        }
    }
}
