use std::collections::BTreeMap;

use anoncreds_clsig::{bls12_381::Scalar, Message};
use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::{
    data_types::{
        cred_def::{CredentialDefinition, CredentialDefinitionId},
        rev_reg_def::RevocationRegistryDefinitionId,
        schema::{Schema, SchemaId},
    },
    error::Result,
    query::Query,
};

/// Normalize an attribute name for comparison: whitespace removed, lower case
pub fn attr_common_view(attr: &str) -> String {
    attr.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Encode a raw attribute value as a decimal integer string.
///
/// Values that parse as a 32-bit signed integer keep their integer form so that
/// predicates can be proven over them. Everything else is hashed with SHA-256.
pub fn encode_credential_attribute(raw_value: &str) -> Result<String> {
    if let Ok(val) = raw_value.parse::<i32>() {
        Ok(val.to_string())
    } else {
        let digest = Sha256::digest(raw_value.as_bytes());
        Ok(BigUint::from_bytes_be(digest.as_slice()).to_str_radix(10))
    }
}

/// Encode a list of raw attribute values
pub fn encode_credential_attributes(raw_values: &[String]) -> Result<Vec<String>> {
    raw_values
        .iter()
        .map(|raw| encode_credential_attribute(raw))
        .collect()
}

/// Parse a decimal integer, optionally negative, reduced into the scalar field
pub fn scalar_from_decimal(value: &str) -> Result<Scalar> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, value),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err_msg!("Invalid decimal value"));
    }
    let int = BigUint::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| err_msg!("Invalid decimal value"))?;
    let mut wide = [0u8; 64];
    let bytes = int.to_bytes_le();
    if bytes.len() > wide.len() {
        return Err(err_msg!("Decimal value exceeds 512 bits"));
    }
    wide[..bytes.len()].copy_from_slice(&bytes);
    let scalar = Scalar::from_bytes_wide(&wide);
    Ok(if negative { -scalar } else { scalar })
}

/// Format a scalar as a decimal integer
pub fn scalar_to_decimal(value: &Scalar) -> String {
    BigUint::from_bytes_le(&value.to_bytes()).to_str_radix(10)
}

/// Parse an encoded attribute as a signed message, for predicate proofs
pub(crate) fn encoded_to_i32(encoded: &str) -> Result<i32> {
    encoded
        .parse::<i32>()
        .map_err(err_map!("Attribute encoding is not a 32-bit integer"))
}

/// The signature message for an encoded attribute value
pub(crate) fn encoded_to_message(encoded: &str) -> Result<Message> {
    scalar_from_decimal(encoded).map(Message::from)
}

/// Normalize the attribute name of an `attr::<name>::value` or `attr::<name>::marker` tag
fn normalize_tag_name(name: String) -> String {
    if let Some(rest) = name.strip_prefix("attr::") {
        for suffix in ["::value", "::marker"] {
            if let Some(attr) = rest.strip_suffix(suffix) {
                return format!("attr::{}{}", attr_common_view(attr), suffix);
            }
        }
    }
    name
}

/// The public tags of a credential that restriction queries are evaluated against
pub(crate) fn credential_tags<'v>(
    schema_id: &SchemaId,
    schema: &Schema,
    cred_def_id: &CredentialDefinitionId,
    cred_def: &CredentialDefinition,
    rev_reg_id: Option<&RevocationRegistryDefinitionId>,
    values: impl IntoIterator<Item = (&'v str, &'v str)>,
) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    tags.insert("schema_id".to_string(), schema_id.to_string());
    tags.insert("schema_issuer_id".to_string(), schema.issuer_id.to_string());
    tags.insert("schema_name".to_string(), schema.name.clone());
    tags.insert("schema_version".to_string(), schema.version.clone());
    tags.insert("issuer_id".to_string(), cred_def.issuer_id.to_string());
    tags.insert("cred_def_id".to_string(), cred_def_id.to_string());
    if let Some(rev_reg_id) = rev_reg_id {
        tags.insert("rev_reg_id".to_string(), rev_reg_id.to_string());
    }
    for attr in cred_def.attr_names() {
        tags.insert(
            format!("attr::{}::marker", attr_common_view(attr)),
            "1".to_string(),
        );
    }
    for (name, raw) in values {
        tags.insert(
            format!("attr::{}::value", attr_common_view(name)),
            raw.to_string(),
        );
    }
    tags
}

/// Evaluate a restriction query, with attribute names in tags compared in normalized form
pub(crate) fn restriction_matches(query: &Query, tags: &BTreeMap<String, String>) -> bool {
    query.clone().map_names(&mut normalize_tag_name).matches(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_values() {
        assert_eq!(
            encode_credential_attribute("value2").unwrap(),
            "2360207505573967335061705667247358223962382058438765247085581582985596391831"
        );
        assert_eq!(
            encode_credential_attributes(&["value1".to_string(), "28".to_string()]).unwrap(),
            vec![
                "27404702143883897701950953229849815393032792099783647152371385368148256400014"
                    .to_string(),
                "28".to_string()
            ]
        );
        assert_eq!(encode_credential_attribute("-5").unwrap(), "-5");
        assert_eq!(encode_credential_attribute("007").unwrap(), "7");
        assert_ne!(encode_credential_attribute("2147483648").unwrap(), "2147483648");
    }

    #[test]
    fn common_view() {
        assert_eq!(attr_common_view("First Name"), "firstname");
        assert_eq!(attr_common_view(" AGE\t"), "age");
    }

    #[test]
    fn restriction_tags() {
        assert_eq!(normalize_tag_name("attr::First Name::value".to_string()), "attr::firstname::value");
        assert_eq!(normalize_tag_name("schema_name".to_string()), "schema_name");
        assert_eq!(normalize_tag_name("attr::Age::other".to_string()), "attr::Age::other");
    }

    #[test]
    fn decimal_scalars() {
        let s = scalar_from_decimal("1234").expect("Error parsing decimal");
        assert_eq!(s, Scalar::from(1234u64));
        assert_eq!(scalar_to_decimal(&s), "1234");
        assert_eq!(
            scalar_from_decimal("-3").unwrap() + Scalar::from(3u64),
            Scalar::zero()
        );
        assert!(scalar_from_decimal("").is_err());
        assert!(scalar_from_decimal("12x").is_err());
        assert!(scalar_from_decimal("-").is_err());
    }
}
