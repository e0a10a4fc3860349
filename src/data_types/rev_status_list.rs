use anoncreds_clsig::{bls12_381::Scalar, registry_element, Accumulator};
use serde::{Deserialize, Serialize};

use crate::data_types::{issuer_id::IssuerId, rev_reg_def::RevocationRegistryDefinitionId};

/// A timestamped snapshot of the revoked indices and accumulator of a registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationStatusList {
    pub issuer_id: IssuerId,
    pub rev_reg_def_id: RevocationRegistryDefinitionId,
    #[serde(with = "crate::serde_utils::as_bit_list")]
    pub revocation_list: Vec<bool>,
    #[serde(
        rename = "currentAccumulator",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub accum: Option<Accumulator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// The last assigned timestamp in the sequence, kept while this list is unstamped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_timestamp: Option<u64>,
}

impl RevocationStatusList {
    /// The latest timestamp assigned to this list or any of its predecessors
    pub fn latest_timestamp(&self) -> Option<u64> {
        self.timestamp.or(self.prev_timestamp)
    }

    /// The number of indices tracked by the list
    pub fn max_cred_num(&self) -> u32 {
        self.revocation_list.len() as u32
    }

    /// Check whether a registry index is revoked, if the index is in range
    pub fn is_revoked(&self, index: u32) -> Option<bool> {
        if index == 0 {
            return None;
        }
        self.revocation_list.get(index as usize - 1).copied()
    }

    /// The revoked registry indices, in increasing order
    pub fn revoked_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.revocation_list
            .iter()
            .enumerate()
            .filter(|(_, revoked)| **revoked)
            .map(|(pos, _)| pos as u32 + 1)
    }

    /// The accumulator elements of the revoked indices
    pub(crate) fn revoked_elements(&self) -> Vec<Scalar> {
        self.revoked_indices()
            .map(|idx| registry_element(self.rev_reg_def_id.as_str(), idx))
            .collect()
    }

    /// The registry indices with a different revocation state in another list
    pub(crate) fn changed_indices(&self, other: &RevocationStatusList) -> Vec<u32> {
        self.revocation_list
            .iter()
            .zip(other.revocation_list.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(pos, _)| pos as u32 + 1)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::JsonObject;

    #[test]
    fn status_list_json() {
        let json = r#"{"issuerId":"mock:uri","revRegDefId":"mock:uri:reg","revocationList":[0,1,0,1],"timestamp":12}"#;
        let list = RevocationStatusList::from_json(json).unwrap();
        assert_eq!(list.revoked_indices().collect::<Vec<_>>(), [2, 4]);
        assert_eq!(list.is_revoked(1), Some(false));
        assert_eq!(list.is_revoked(4), Some(true));
        assert_eq!(list.is_revoked(0), None);
        assert_eq!(list.is_revoked(5), None);
        assert_eq!(list.to_json().unwrap(), json);
    }
}
