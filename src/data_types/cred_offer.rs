use serde::{Deserialize, Serialize};

use crate::data_types::{
    cred_def::{CredentialDefinitionId, CredentialKeyCorrectnessProof},
    nonce::Nonce,
    schema::SchemaId,
};

/// An issuer offer to issue a credential
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialOffer {
    pub schema_id: SchemaId,
    pub cred_def_id: CredentialDefinitionId,
    pub key_correctness_proof: CredentialKeyCorrectnessProof,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Nonce>,
}
