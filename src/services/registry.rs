//! Serialized index and timestamp allocation for revocation registries

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::{
    data_types::{
        rev_reg_def::{RevocationRegistryDefinition, RevocationRegistryDefinitionId},
        rev_status_list::RevocationStatusList,
    },
    error::Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RegistryCursor {
    max_cred_num: u32,
    next_index: u32,
    last_timestamp: Option<u64>,
}

/// Hands out unused registry indices and strictly increasing status list timestamps.
///
/// Issuers sharing a registry should route every issuance and status list update
/// through a single allocator.
#[derive(Debug, Default)]
pub struct RegistryAllocator {
    registries: Mutex<BTreeMap<RevocationRegistryDefinitionId, RegistryCursor>>,
}

impl RegistryAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<RevocationRegistryDefinitionId, RegistryCursor>>> {
        self.registries
            .lock()
            .map_err(|_| err_msg!(Unexpected, "Registry allocator lock poisoned"))
    }

    /// Start tracking a registry. `allocated` is the number of indices already in use
    /// and `last_timestamp` the timestamp of the latest published status list.
    pub fn register(
        &self,
        rev_reg_def_id: RevocationRegistryDefinitionId,
        rev_reg_def: &RevocationRegistryDefinition,
        allocated: u32,
        last_timestamp: Option<u64>,
    ) -> Result<()> {
        let max_cred_num = rev_reg_def.max_cred_num();
        if allocated > max_cred_num {
            return Err(err_msg!(
                IndexOutOfRange,
                "Allocated count exceeds registry size"
            ));
        }
        let mut registries = self.lock()?;
        if registries.contains_key(&rev_reg_def_id) {
            return Err(err_msg!(
                InvalidState,
                "Registry already registered: {}",
                rev_reg_def_id
            ));
        }
        trace!("Register revocation registry: {}", rev_reg_def_id);
        registries.insert(
            rev_reg_def_id,
            RegistryCursor {
                max_cred_num,
                next_index: allocated + 1,
                last_timestamp,
            },
        );
        Ok(())
    }

    /// Start tracking a registry from its latest status list
    pub fn register_status_list(
        &self,
        rev_reg_def: &RevocationRegistryDefinition,
        status_list: &RevocationStatusList,
        allocated: u32,
    ) -> Result<()> {
        self.register(
            status_list.rev_reg_def_id.clone(),
            rev_reg_def,
            allocated,
            status_list.timestamp,
        )
    }

    /// Allocate the next unused index of a registry
    pub fn allocate_index(&self, rev_reg_def_id: &RevocationRegistryDefinitionId) -> Result<u32> {
        let mut registries = self.lock()?;
        let cursor = registries
            .get_mut(rev_reg_def_id)
            .ok_or_else(|| err_msg!("Unknown revocation registry: {}", rev_reg_def_id))?;
        if cursor.next_index > cursor.max_cred_num {
            return Err(err_msg!(
                RegistryFull,
                "Revocation registry is full: {}",
                rev_reg_def_id
            ));
        }
        let index = cursor.next_index;
        cursor.next_index += 1;
        debug!("Allocated index {} in registry {}", index, rev_reg_def_id);
        Ok(index)
    }

    /// Claim a timestamp for the next status list of a registry
    pub fn reserve_timestamp(
        &self,
        rev_reg_def_id: &RevocationRegistryDefinitionId,
        timestamp: u64,
    ) -> Result<()> {
        let mut registries = self.lock()?;
        let cursor = registries
            .get_mut(rev_reg_def_id)
            .ok_or_else(|| err_msg!("Unknown revocation registry: {}", rev_reg_def_id))?;
        if let Some(last) = cursor.last_timestamp {
            if timestamp <= last {
                return Err(err_msg!(
                    NonMonotonicTimestamp,
                    "Timestamp {} does not follow {}",
                    timestamp,
                    last
                ));
            }
        }
        cursor.last_timestamp = Some(timestamp);
        Ok(())
    }

    /// The number of indices still available in a registry
    pub fn remaining(&self, rev_reg_def_id: &RevocationRegistryDefinitionId) -> Result<u32> {
        let registries = self.lock()?;
        registries
            .get(rev_reg_def_id)
            .map(|cursor| (cursor.max_cred_num + 1).saturating_sub(cursor.next_index))
            .ok_or_else(|| err_msg!("Unknown revocation registry: {}", rev_reg_def_id))
    }
}
