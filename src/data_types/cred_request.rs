use anoncreds_clsig::{Blinding, Commitment, CommitmentProof, ProofChallenge};
use serde::{Deserialize, Serialize};

use crate::data_types::cred_def::CredentialDefinitionId;

/// The proof of knowledge of the committed link secret
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindedLinkSecretCorrectnessProof {
    pub c: ProofChallenge,
    pub resp: CommitmentProof,
}

/// A holder request for a credential, carrying a commitment to the link secret
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prover_did: Option<String>,
    pub cred_def_id: CredentialDefinitionId,
    pub blinded_ms: Commitment,
    pub blinded_ms_correctness_proof: BlindedLinkSecretCorrectnessProof,
}

/// Private holder state needed to process the issued credential
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequestMetadata {
    pub link_secret_blinding_data: Blinding,
    pub link_secret_name: String,
}
