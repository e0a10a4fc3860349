use anoncreds_clsig::{DynGenerators, KeyCorrectnessProof, KeyPair, PublicKey, SecretKey};
use serde::{Deserialize, Serialize};

use crate::{
    data_types::{issuer_id::IssuerId, schema::SchemaId},
    helpers::attr_common_view,
};

impl_object_id!(CredentialDefinitionId, "An opaque credential definition identifier");

/// The proof that a credential definition public key was correctly generated
pub type CredentialKeyCorrectnessProof = KeyCorrectnessProof;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureType {
    CL,
}

/// Options for creating a credential definition
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CredentialDefinitionConfig {
    pub support_revocation: bool,
}

impl CredentialDefinitionConfig {
    pub fn new(support_revocation: bool) -> Self {
        Self { support_revocation }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPrimaryPublicKey {
    pub w: PublicKey,
    pub attrs: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDefinitionData {
    pub primary: CredentialPrimaryPublicKey,
    pub revocation: bool,
}

/// The public issuer key for credentials over a schema
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDefinition {
    pub schema_id: SchemaId,
    #[serde(rename = "type")]
    pub signature_type: SignatureType,
    pub tag: String,
    pub value: CredentialDefinitionData,
    pub issuer_id: IssuerId,
}

impl CredentialDefinition {
    pub fn public_key(&self) -> &PublicKey {
        &self.value.primary.w
    }

    /// The attribute names in signing order
    pub fn attr_names(&self) -> &[String] {
        &self.value.primary.attrs
    }

    /// Find the position of an attribute by its normalized name
    pub fn attr_index(&self, name: &str) -> Option<usize> {
        let name = attr_common_view(name);
        self.attr_names()
            .iter()
            .position(|attr| attr_common_view(attr) == name)
    }

    pub fn support_revocation(&self) -> bool {
        self.value.revocation
    }

    /// The number of signed messages: link secret, attributes, and for revocable
    /// credentials the registry id and revocation element
    pub fn message_count(&self) -> usize {
        1 + self.attr_names().len() + 2 * usize::from(self.support_revocation())
    }

    pub(crate) fn generators(&self) -> DynGenerators {
        DynGenerators::new(self.public_key(), self.message_count())
    }

    /// Message index of the hidden revocation element, when revocation is supported.
    /// The revealed registry id message directly precedes it.
    pub(crate) fn revocation_message_index(&self) -> Option<usize> {
        self.support_revocation()
            .then(|| 2 + self.attr_names().len())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPrivateKey {
    pub x: SecretKey,
}

/// The issuer signing key, never shared
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDefinitionPrivate {
    pub value: CredentialPrivateKey,
}

impl CredentialDefinitionPrivate {
    pub(crate) fn keypair(&self) -> KeyPair {
        KeyPair::from_secret_key(self.value.x.clone())
    }
}
