use std::collections::{BTreeMap, BTreeSet};

use crate::data_types::{
    credential::Credential,
    rev_reg_def::{
        RevocationRegistryDefinition, RevocationRegistryDefinitionId,
        RevocationRegistryDefinitionPrivate,
    },
    rev_state::CredentialRevocationState,
    rev_status_list::RevocationStatusList,
};

pub use crate::data_types::{
    cred_def::{CredentialDefinitionConfig, SignatureType},
    credential::{CredentialValues, MakeCredentialValues},
    pres_request::PredicateType,
    rev_reg_def::RegistryType,
};

/// The registry state used to issue a revocable credential.
///
/// The status list must belong to the registry named by `reg_def_id`, and the
/// registry must be defined for the credential definition being issued.
#[derive(Clone, Copy, Debug)]
pub struct CredentialRevocationConfig<'a> {
    pub reg_def_id: &'a RevocationRegistryDefinitionId,
    pub reg_def: &'a RevocationRegistryDefinition,
    pub reg_def_private: &'a RevocationRegistryDefinitionPrivate,
    pub status_list: &'a RevocationStatusList,
    pub registry_idx: u32,
}

impl<'a> CredentialRevocationConfig<'a> {
    pub fn new(
        reg_def_id: &'a RevocationRegistryDefinitionId,
        reg_def: &'a RevocationRegistryDefinition,
        reg_def_private: &'a RevocationRegistryDefinitionPrivate,
        status_list: &'a RevocationStatusList,
        registry_idx: u32,
    ) -> Self {
        Self {
            reg_def_id,
            reg_def,
            reg_def_private,
            status_list,
            registry_idx,
        }
    }
}

/// Replaces the requested interval start for one registry with a specific status list.
///
/// When a sub-proof for the registry is checked against a request interval starting at
/// `requested_from_ts`, it must instead use the status list at `override_rev_status_list_ts`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonRevokedIntervalOverride {
    pub rev_reg_def_id: RevocationRegistryDefinitionId,
    pub requested_from_ts: u64,
    pub override_rev_status_list_ts: u64,
}

impl NonRevokedIntervalOverride {
    pub fn new(
        rev_reg_def_id: RevocationRegistryDefinitionId,
        requested_from_ts: u64,
        override_rev_status_list_ts: u64,
    ) -> Self {
        Self {
            rev_reg_def_id,
            requested_from_ts,
            override_rev_status_list_ts,
        }
    }
}

/// The credentials used in a presentation and the referents each one resolves
#[derive(Clone, Debug, Default)]
pub struct PresentCredentials<'p>(pub(crate) Vec<PresentCredential<'p>>);

impl<'p> PresentCredentials<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential, with the revocation state and status list timestamp to prove
    /// non-revocation against
    pub fn add_credential(
        &mut self,
        cred: &'p Credential,
        timestamp: Option<u64>,
        rev_state: Option<&'p CredentialRevocationState>,
    ) -> AddCredential<'_, 'p> {
        let idx = self.0.len();
        self.0.push(PresentCredential {
            cred,
            timestamp: timestamp.or_else(|| rev_state.map(|state| state.timestamp)),
            rev_state,
            requested_attributes: BTreeMap::new(),
            requested_predicates: BTreeSet::new(),
        });
        AddCredential {
            present: &mut self.0[idx],
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct PresentCredential<'p> {
    pub cred: &'p Credential,
    pub timestamp: Option<u64>,
    pub rev_state: Option<&'p CredentialRevocationState>,
    pub requested_attributes: BTreeMap<String, bool>,
    pub requested_predicates: BTreeSet<String>,
}

impl PresentCredential<'_> {
    pub fn is_empty(&self) -> bool {
        self.requested_attributes.is_empty() && self.requested_predicates.is_empty()
    }
}

/// Assigns request referents to a credential in a presentation
#[derive(Debug)]
pub struct AddCredential<'a, 'p> {
    present: &'a mut PresentCredential<'p>,
}

impl AddCredential<'_, '_> {
    /// Resolve an attribute referent from this credential, revealed or hidden
    pub fn add_requested_attribute(&mut self, referent: impl Into<String>, revealed: bool) {
        self.present
            .requested_attributes
            .insert(referent.into(), revealed);
    }

    /// Resolve a predicate referent from this credential
    pub fn add_requested_predicate(&mut self, referent: impl Into<String>) {
        self.present.requested_predicates.insert(referent.into());
    }
}
