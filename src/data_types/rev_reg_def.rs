use anoncreds_clsig::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};

use crate::{
    data_types::{cred_def::CredentialDefinitionId, issuer_id::IssuerId},
    error::Result,
};

impl_object_id!(
    RevocationRegistryDefinitionId,
    "An opaque revocation registry definition identifier"
);

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryType {
    CL_ACCUM,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatorKey {
    pub z: PublicKey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryPublicKeys {
    pub accum_key: AccumulatorKey,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinitionValue {
    pub max_cred_num: u32,
    pub public_keys: RevocationRegistryPublicKeys,
    pub tails_location: String,
    pub tails_hash: String,
}

/// The public parameters of a revocation registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinition {
    pub issuer_id: IssuerId,
    pub revoc_def_type: RegistryType,
    pub tag: String,
    pub cred_def_id: CredentialDefinitionId,
    pub value: RevocationRegistryDefinitionValue,
}

impl RevocationRegistryDefinition {
    pub fn max_cred_num(&self) -> u32 {
        self.value.max_cred_num
    }

    pub fn accum_key(&self) -> &PublicKey {
        &self.value.public_keys.accum_key.z
    }

    /// Look up one of the public properties of the registry
    pub fn get_attribute(&self, name: &str) -> Result<String> {
        match name {
            "max_cred_num" => Ok(self.value.max_cred_num.to_string()),
            "tails_location" => Ok(self.value.tails_location.clone()),
            "tails_hash" => Ok(self.value.tails_hash.clone()),
            "cred_def_id" => Ok(self.cred_def_id.to_string()),
            "issuer_id" => Ok(self.issuer_id.to_string()),
            _ => Err(err_msg!(
                "Unsupported revocation registry attribute: {}",
                name
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRegistryDefinitionValuePrivate {
    pub gamma: SecretKey,
}

/// The registry secret, held by the issuer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRegistryDefinitionPrivate {
    pub value: RevocationRegistryDefinitionValuePrivate,
}

impl RevocationRegistryDefinitionPrivate {
    pub(crate) fn keypair(&self) -> anoncreds_clsig::KeyPair {
        anoncreds_clsig::KeyPair::from_secret_key(self.value.gamma.clone())
    }
}
