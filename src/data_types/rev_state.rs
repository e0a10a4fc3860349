use anoncreds_clsig::NonMembershipWitness;
use serde::{Deserialize, Serialize};

use crate::data_types::credential::RevocationRegistry;

/// The holder witness for a credential against a status list snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRevocationState {
    pub witness: NonMembershipWitness,
    pub rev_reg: RevocationRegistry,
    pub timestamp: u64,
}
