use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{data_types::issuer_id::IssuerId, error::Result, helpers::attr_common_view};

impl_object_id!(SchemaId, "An opaque schema identifier");

/// An ordered list of attribute names
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeNames(pub Vec<String>);

impl AttributeNames {
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[&str]> for AttributeNames {
    fn from(attrs: &[&str]) -> Self {
        Self(attrs.iter().map(|a| a.to_string()).collect())
    }
}

impl From<Vec<String>> for AttributeNames {
    fn from(attrs: Vec<String>) -> Self {
        Self(attrs)
    }
}

/// An ordered set of attribute names published by an issuer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    pub version: String,
    pub attr_names: AttributeNames,
    pub issuer_id: IssuerId,
}

impl Schema {
    /// Check that the attribute names are present and distinct
    pub fn validate(&self) -> Result<()> {
        if self.attr_names.is_empty() {
            return Err(err_msg!(InvalidSchema, "Schema must have at least one attribute"));
        }
        let mut seen = HashSet::with_capacity(self.attr_names.len());
        for name in self.attr_names.iter() {
            let common = attr_common_view(name);
            if common.is_empty() {
                return Err(err_msg!(InvalidSchema, "Empty attribute name"));
            }
            if !seen.insert(common) {
                return Err(err_msg!(InvalidSchema, "Duplicate attribute name: {}", name));
            }
        }
        Ok(())
    }
}
