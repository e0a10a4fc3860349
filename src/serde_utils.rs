use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{
    de::{SeqAccess, Visitor},
    Deserializer, Serializer,
};

/// Serialize a `FromStr + AsRef<str>` type as a JSON string
macro_rules! serde_as_str_impl {
    ($t:ident) => {
        impl serde::Serialize for $t {
            fn serialize<S: serde::Serializer>(
                &self,
                ser: S,
            ) -> ::core::result::Result<S::Ok, S::Error> {
                $crate::serde_utils::as_str::serialize(self, ser)
            }
        }

        impl<'de> serde::Deserialize<'de> for $t {
            fn deserialize<D: serde::Deserializer<'de>>(
                de: D,
            ) -> ::core::result::Result<Self, D::Error> {
                $crate::serde_utils::as_str::deserialize(de)
            }
        }
    };
}

/// Values represented as strings, also accepting plain JSON integers
pub mod as_str {
    use super::*;

    pub fn serialize<S: Serializer, T: AsRef<str>>(inst: &T, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(inst.as_ref())
    }

    pub fn deserialize<'de, D, T>(de: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        de.deserialize_any(StrOrInt(PhantomData))
    }

    struct StrOrInt<T>(PhantomData<T>);

    impl<T: FromStr> StrOrInt<T>
    where
        T::Err: Display,
    {
        fn parse<E: serde::de::Error>(value: &str) -> Result<T, E> {
            value.parse().map_err(E::custom)
        }
    }

    impl<'de, T: FromStr> Visitor<'de> for StrOrInt<T>
    where
        T::Err: Display,
    {
        type Value = T;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or an integer")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<T, E> {
            Self::parse(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<T, E> {
            Self::parse(&v.to_string())
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<T, E> {
            Self::parse(&v.to_string())
        }
    }
}

/// A list of flags represented as an array of 0 and 1 values
pub mod as_bit_list {
    use super::*;

    pub fn serialize<S>(bits: &[bool], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(bits.iter().map(|b| u8::from(*b)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(BitListVisitor)
    }

    struct BitListVisitor;

    impl<'de> Visitor<'de> for BitListVisitor {
        type Value = Vec<bool>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("an array of 0 and 1 values")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut bits = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(bit) = seq.next_element::<u8>()? {
                match bit {
                    0 => bits.push(false),
                    1 => bits.push(true),
                    _ => return Err(serde::de::Error::custom("expected 0 or 1")),
                }
            }
            Ok(bits)
        }
    }
}
