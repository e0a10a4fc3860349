//! Public protocol entities and their canonical JSON forms

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

macro_rules! impl_object_id {
    ($type:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $type(pub String);

        impl $type {
            pub fn new(id: impl Into<String>) -> $crate::error::Result<Self> {
                let id = id.into();
                if id.is_empty() {
                    return Err(err_msg!(concat!(stringify!($type), " must not be empty")));
                }
                Ok(Self(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $type {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $type {
            type Err = $crate::error::Error;

            fn from_str(s: &str) -> $crate::error::Result<Self> {
                Self::new(s)
            }
        }

        impl From<&str> for $type {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        serde_as_str_impl!($type);
    };
}

pub mod cred_def;
pub mod cred_offer;
pub mod cred_request;
pub mod credential;
pub mod issuer_id;
pub mod link_secret;
pub mod nonce;
pub mod pres_request;
pub mod presentation;
pub mod rev_reg_def;
pub mod rev_state;
pub mod rev_status_list;
pub mod schema;

/// Canonical JSON conversion shared by the protocol entities
pub trait JsonObject: Serialize + DeserializeOwned {
    /// The name of the entity in error messages
    const TYPE_NAME: &'static str;

    fn from_json(json: impl AsRef<[u8]>) -> Result<Self> {
        serde_json::from_slice(json.as_ref())
            .map_err(err_map!(Input, "Invalid JSON for {}", Self::TYPE_NAME))
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(err_map!(Unexpected, "Error serializing {}", Self::TYPE_NAME))
    }
}

macro_rules! impl_json_object {
    ($($type:ty => $name:expr),+ $(,)?) => {
        $(
            impl JsonObject for $type {
                const TYPE_NAME: &'static str = $name;
            }
        )+
    };
}

impl_json_object!(
    schema::Schema => "Schema",
    cred_def::CredentialDefinition => "CredentialDefinition",
    cred_def::CredentialDefinitionPrivate => "CredentialDefinitionPrivate",
    cred_def::CredentialKeyCorrectnessProof => "KeyCorrectnessProof",
    cred_offer::CredentialOffer => "CredentialOffer",
    cred_request::CredentialRequest => "CredentialRequest",
    cred_request::CredentialRequestMetadata => "CredentialRequestMetadata",
    credential::Credential => "Credential",
    credential::RevocationRegistry => "RevocationRegistry",
    pres_request::PresentationRequest => "PresentationRequest",
    presentation::Presentation => "Presentation",
    rev_reg_def::RevocationRegistryDefinition => "RevocationRegistryDefinition",
    rev_reg_def::RevocationRegistryDefinitionPrivate => "RevocationRegistryDefinitionPrivate",
    rev_state::CredentialRevocationState => "CredentialRevocationState",
    rev_status_list::RevocationStatusList => "RevocationStatusList",
);

#[cfg(test)]
mod tests {
    use super::{issuer_id::IssuerId, schema::SchemaId};

    #[test]
    fn object_ids() {
        let id = SchemaId::new("mock:uri").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"mock:uri\"");
        assert_eq!(serde_json::from_str::<SchemaId>("\"mock:uri\"").unwrap(), id);
        assert!(IssuerId::new("").is_err());
        assert!(serde_json::from_str::<IssuerId>("\"\"").is_err());
    }
}
