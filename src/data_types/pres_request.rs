use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

pub use anoncreds_clsig::PredicateType;

use crate::{data_types::nonce::Nonce, error::Result, query::Query};

/// A verifier request for attributes and predicates over held credentials
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationRequest {
    pub nonce: Nonce,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub requested_attributes: BTreeMap<String, AttributeInfo>,
    #[serde(default)]
    pub requested_predicates: BTreeMap<String, PredicateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

impl PresentationRequest {
    /// Check that referents are distinct and each attribute names at least one value
    pub fn validate(&self) -> Result<()> {
        for (referent, info) in self.requested_attributes.iter() {
            match (&info.name, &info.names) {
                (Some(_), None) => {}
                (None, Some(names)) if !names.is_empty() => {}
                _ => {
                    return Err(err_msg!(
                        "Requested attribute '{}' must have one of 'name' or 'names'",
                        referent
                    ))
                }
            }
        }
        let mut seen = HashSet::new();
        for referent in self
            .requested_attributes
            .keys()
            .chain(self.requested_predicates.keys())
        {
            if !seen.insert(referent) {
                return Err(err_msg!("Duplicate referent: {}", referent));
            }
        }
        Ok(())
    }

    /// The effective non-revocation interval for an attribute referent
    pub fn attribute_interval(&self, referent: &str) -> Option<&NonRevokedInterval> {
        self.requested_attributes
            .get(referent)
            .and_then(|info| info.non_revoked.as_ref())
            .or(self.non_revoked.as_ref())
    }

    /// The effective non-revocation interval for a predicate referent
    pub fn predicate_interval(&self, referent: &str) -> Option<&NonRevokedInterval> {
        self.requested_predicates
            .get(referent)
            .and_then(|info| info.non_revoked.as_ref())
            .or(self.non_revoked.as_ref())
    }
}

/// A requested attribute, or group of attributes from one credential
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Query>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

impl AttributeInfo {
    /// The attribute names covered by this request
    pub fn attr_names(&self) -> Vec<&str> {
        match (&self.name, &self.names) {
            (Some(name), _) => vec![name.as_str()],
            (None, Some(names)) => names.iter().map(String::as_str).collect(),
            (None, None) => Vec::new(),
        }
    }

    pub fn is_group(&self) -> bool {
        self.name.is_none() && self.names.is_some()
    }
}

/// A requested predicate over an integer attribute
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateInfo {
    pub name: String,
    pub p_type: PredicateType,
    pub p_value: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Query>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

/// An accepted window for the timestamp of a revocation status list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonRevokedInterval {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
}

impl NonRevokedInterval {
    pub fn new(from: Option<u64>, to: Option<u64>) -> Self {
        Self { from, to }
    }

    /// Check that a timestamp lies within the interval bounds
    pub fn is_valid(&self, timestamp: u64) -> bool {
        self.from.map_or(true, |from| from <= timestamp)
            && self.to.map_or(true, |to| timestamp <= to)
    }
}
