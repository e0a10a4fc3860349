use std::collections::BTreeMap;

use anoncreds_clsig::{Accumulator, NonMembershipWitness, Signature};
use serde::{Deserialize, Serialize};

use crate::{
    data_types::{
        cred_def::CredentialDefinitionId, rev_reg_def::RevocationRegistryDefinitionId,
        schema::SchemaId,
    },
    error::Result,
    helpers::{attr_common_view, encode_credential_attribute},
};

/// The raw and encoded forms of an attribute value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValues {
    pub raw: String,
    pub encoded: String,
}

/// Attribute values keyed by attribute name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialValues(pub BTreeMap<String, AttributeValues>);

impl CredentialValues {
    /// Look up an attribute by its normalized name
    pub fn get(&self, name: &str) -> Option<&AttributeValues> {
        self.0.get(name).or_else(|| {
            let name = attr_common_view(name);
            self.0
                .iter()
                .find(|(attr, _)| attr_common_view(attr) == name)
                .map(|(_, value)| value)
        })
    }
}

/// Builder for credential values from raw attribute strings
#[derive(Clone, Debug, Default)]
pub struct MakeCredentialValues(CredentialValues);

impl MakeCredentialValues {
    /// Add a raw value, computing the standard encoding
    pub fn add_raw(&mut self, name: impl Into<String>, raw: impl Into<String>) -> Result<()> {
        let raw = raw.into();
        let encoded = encode_credential_attribute(&raw)?;
        self.add_encoded(name, raw, encoded);
        Ok(())
    }

    /// Add a value with a caller-provided encoding
    pub fn add_encoded(
        &mut self,
        name: impl Into<String>,
        raw: impl Into<String>,
        encoded: impl Into<String>,
    ) {
        self.0 .0.insert(
            name.into(),
            AttributeValues {
                raw: raw.into(),
                encoded: encoded.into(),
            },
        );
    }
}

impl From<MakeCredentialValues> for CredentialValues {
    fn from(values: MakeCredentialValues) -> Self {
        values.0
    }
}

/// The accumulator value a credential witness was computed against
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRegistry {
    pub accum: Accumulator,
}

/// A signed credential held by the holder
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub schema_id: SchemaId,
    pub cred_def_id: CredentialDefinitionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<RevocationRegistryDefinitionId>,
    pub values: CredentialValues,
    pub signature: Signature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg: Option<RevocationRegistry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<NonMembershipWitness>,
}

impl Credential {
    /// Look up one of the public identifying properties of the credential
    pub fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        match name {
            "schema_id" => Ok(Some(self.schema_id.to_string())),
            "cred_def_id" => Ok(Some(self.cred_def_id.to_string())),
            "rev_reg_id" => Ok(self.rev_reg_id.as_ref().map(ToString::to_string)),
            "rev_reg_index" => Ok(self.rev_reg_index.map(|idx| idx.to_string())),
            _ => Err(err_msg!("Unsupported credential attribute: {}", name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_values() {
        let mut values = MakeCredentialValues::default();
        values.add_raw("age", "28").unwrap();
        values.add_raw("name", "Alex").unwrap();
        let values = CredentialValues::from(values);
        assert_eq!(values.get("age").unwrap().encoded, "28");
        assert_eq!(values.get("Na me").unwrap().raw, "Alex");
        assert!(values.get("sex").is_none());
    }
}
