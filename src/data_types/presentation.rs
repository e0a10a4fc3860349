use std::collections::BTreeMap;

use anoncreds_clsig::{
    CreateChallenge, Error as ClsigError, NonRevocationProof, ProofChallenge, RangeProof,
    SignatureProof, WriteBuffer,
};
use serde::{Deserialize, Serialize};

use crate::data_types::{
    cred_def::CredentialDefinitionId, credential::AttributeValues, pres_request::PredicateType,
    rev_reg_def::RevocationRegistryDefinitionId, schema::SchemaId,
};

/// A zero-knowledge presentation in response to a presentation request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub proof: Proof,
    pub requested_proof: RequestedProof,
    pub identifiers: Vec<Identifier>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub proofs: Vec<SubProof>,
    pub aggregated_proof: AggregatedProof,
}

/// The shared Fiat-Shamir challenge over all sub-proofs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedProof {
    pub c_hash: ProofChallenge,
}

/// The proofs over a single credential
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubProof {
    pub primary_proof: PrimaryProof,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoc_proof: Option<NonRevocationProof>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryProof {
    pub eq_proof: SignatureProof,
    #[serde(default)]
    pub ge_proofs: Vec<PredicateProof>,
}

/// A range proof for one requested predicate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateProof {
    pub attr_name: String,
    pub p_type: PredicateType,
    pub p_value: i32,
    pub proof: RangeProof,
}

/// The mapping of request referents to revealed values and sub-proofs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedProof {
    #[serde(default)]
    pub revealed_attrs: BTreeMap<String, RevealedAttributeInfo>,
    #[serde(default)]
    pub revealed_attr_groups: BTreeMap<String, RevealedAttributeGroupInfo>,
    #[serde(default)]
    pub self_attested_attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub unrevealed_attrs: BTreeMap<String, SubProofReferent>,
    #[serde(default)]
    pub predicates: BTreeMap<String, SubProofReferent>,
}

impl RequestedProof {
    /// Look up the sub-proof index recorded for a referent
    pub(crate) fn sub_proof_index(&self, referent: &str) -> Option<u32> {
        self.revealed_attrs
            .get(referent)
            .map(|info| info.sub_proof_index)
            .or_else(|| {
                self.revealed_attr_groups
                    .get(referent)
                    .map(|info| info.sub_proof_index)
            })
            .or_else(|| {
                self.unrevealed_attrs
                    .get(referent)
                    .map(|info| info.sub_proof_index)
            })
            .or_else(|| {
                self.predicates
                    .get(referent)
                    .map(|info| info.sub_proof_index)
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedAttributeInfo {
    pub sub_proof_index: u32,
    pub raw: String,
    pub encoded: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedAttributeGroupInfo {
    pub sub_proof_index: u32,
    pub values: BTreeMap<String, AttributeValues>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubProofReferent {
    pub sub_proof_index: u32,
}

/// The public objects and status list timestamp used by a sub-proof
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub schema_id: SchemaId,
    pub cred_def_id: CredentialDefinitionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<RevocationRegistryDefinitionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

fn write_field(writer: &mut dyn WriteBuffer, value: Option<&[u8]>) -> Result<(), ClsigError> {
    match value {
        Some(value) => {
            writer.buffer_write(&[1])?;
            writer.buffer_write(&(value.len() as u64).to_be_bytes())?;
            writer.buffer_write(value)
        }
        None => writer.buffer_write(&[0]),
    }
}

/// The public objects of a sub-proof are bound into the shared challenge
impl CreateChallenge for Identifier {
    fn write_challenge_bytes(&self, writer: &mut dyn WriteBuffer) -> Result<(), ClsigError> {
        write_field(writer, Some(self.schema_id.as_str().as_bytes()))?;
        write_field(writer, Some(self.cred_def_id.as_str().as_bytes()))?;
        write_field(writer, self.rev_reg_id.as_ref().map(|id| id.as_str().as_bytes()))?;
        let timestamp = self.timestamp.map(u64::to_be_bytes);
        write_field(writer, timestamp.as_ref().map(|ts| &ts[..]))
    }
}
