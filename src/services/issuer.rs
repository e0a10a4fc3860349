use std::collections::BTreeSet;

use anoncreds_clsig::{
    bls12_381::Scalar, registry_element, registry_id_message, Accumulator, DynGenerators,
    KeyCorrectnessProof, KeyPair, NonMembershipWitness, SignatureMessages, TailsGenerator,
};
use rand::rngs::OsRng;

use crate::{
    data_types::{
        cred_def::{
            CredentialDefinition, CredentialDefinitionConfig, CredentialDefinitionData,
            CredentialDefinitionId, CredentialDefinitionPrivate, CredentialKeyCorrectnessProof,
            CredentialPrimaryPublicKey, CredentialPrivateKey, SignatureType,
        },
        cred_offer::CredentialOffer,
        cred_request::CredentialRequest,
        credential::{Credential, CredentialValues, RevocationRegistry},
        issuer_id::IssuerId,
        nonce::Nonce,
        rev_reg_def::{
            AccumulatorKey, RegistryType, RevocationRegistryDefinition,
            RevocationRegistryDefinitionId, RevocationRegistryDefinitionPrivate,
            RevocationRegistryDefinitionValue, RevocationRegistryDefinitionValuePrivate,
            RevocationRegistryPublicKeys,
        },
        rev_status_list::RevocationStatusList,
        schema::{AttributeNames, Schema, SchemaId},
    },
    error::Result,
    helpers::encoded_to_message,
    services::{tails::TailsFileWriter, types::CredentialRevocationConfig},
};

/// Create a new schema from a list of attribute names
pub fn create_schema(
    schema_name: &str,
    schema_version: &str,
    issuer_id: IssuerId,
    attr_names: AttributeNames,
) -> Result<Schema> {
    trace!(
        "create_schema >>> schema_name: {:?}, schema_version: {:?}, attr_names: {:?}",
        schema_name,
        schema_version,
        attr_names
    );
    let schema = Schema {
        name: schema_name.to_string(),
        version: schema_version.to_string(),
        attr_names,
        issuer_id,
    };
    schema.validate()?;
    Ok(schema)
}

/// Create a credential definition for a schema, returning the public definition,
/// the private signing key and the key correctness proof
pub fn create_credential_definition(
    schema_id: SchemaId,
    schema: &Schema,
    issuer_id: IssuerId,
    tag: &str,
    signature_type: SignatureType,
    config: CredentialDefinitionConfig,
) -> Result<(
    CredentialDefinition,
    CredentialDefinitionPrivate,
    CredentialKeyCorrectnessProof,
)> {
    trace!(
        "create_credential_definition >>> schema_id: {}, tag: {:?}, config: {:?}",
        schema_id,
        tag,
        config
    );
    schema.validate()?;

    let keypair = KeyPair::random_with_rng(OsRng);
    let cred_def = CredentialDefinition {
        schema_id,
        signature_type,
        tag: tag.to_string(),
        value: CredentialDefinitionData {
            primary: CredentialPrimaryPublicKey {
                w: *keypair.public_key(),
                attrs: schema.attr_names.0.clone(),
            },
            revocation: config.support_revocation,
        },
        issuer_id,
    };
    let correctness_proof =
        KeyCorrectnessProof::new_with_rng(&keypair, cred_def.message_count(), OsRng)?;
    let secret = keypair
        .secret_key()
        .cloned()
        .ok_or_else(|| err_msg!(Unexpected, "Missing credential definition secret key"))?;
    let cred_def_private = CredentialDefinitionPrivate {
        value: CredentialPrivateKey { x: secret },
    };

    debug!(
        "Created credential definition with {} messages",
        cred_def.message_count()
    );
    Ok((cred_def, cred_def_private, correctness_proof))
}

/// Create an offer for a credential, after checking the key correctness proof
pub fn create_credential_offer(
    schema_id: SchemaId,
    cred_def_id: CredentialDefinitionId,
    cred_def: &CredentialDefinition,
    correctness_proof: &CredentialKeyCorrectnessProof,
) -> Result<CredentialOffer> {
    trace!(
        "create_credential_offer >>> schema_id: {}, cred_def_id: {}",
        schema_id,
        cred_def_id
    );
    correctness_proof
        .verify(cred_def.public_key(), cred_def.message_count())
        .map_err(err_map!(
            KeyMismatch,
            "Key correctness proof does not match credential definition"
        ))?;
    Ok(CredentialOffer {
        schema_id,
        cred_def_id,
        key_correctness_proof: correctness_proof.clone(),
        nonce: Some(Nonce::new()?),
    })
}

/// Create a revocation registry for a credential definition and write its tails file
#[allow(clippy::too_many_arguments)]
pub fn create_revocation_registry_def(
    cred_def: &CredentialDefinition,
    cred_def_id: CredentialDefinitionId,
    issuer_id: IssuerId,
    tag: &str,
    rev_reg_type: RegistryType,
    max_cred_num: u32,
    tails_writer: &mut TailsFileWriter,
) -> Result<(
    RevocationRegistryDefinition,
    RevocationRegistryDefinitionPrivate,
)> {
    trace!(
        "create_revocation_registry_def >>> cred_def_id: {}, tag: {:?}, max_cred_num: {}",
        cred_def_id,
        tag,
        max_cred_num
    );
    if !cred_def.support_revocation() {
        return Err(err_msg!(
            RevocationNotSupported,
            "Credential definition does not support revocation"
        ));
    }
    if max_cred_num == 0 {
        return Err(err_msg!("Registry size must be positive"));
    }

    let keypair = KeyPair::random_with_rng(OsRng);
    let (tails_location, tails_hash) =
        tails_writer.write(TailsGenerator::new(&keypair, max_cred_num as usize)?)?;
    let gamma = keypair
        .secret_key()
        .cloned()
        .ok_or_else(|| err_msg!(Unexpected, "Missing registry secret key"))?;

    let rev_reg_def = RevocationRegistryDefinition {
        issuer_id,
        revoc_def_type: rev_reg_type,
        tag: tag.to_string(),
        cred_def_id,
        value: RevocationRegistryDefinitionValue {
            max_cred_num,
            public_keys: RevocationRegistryPublicKeys {
                accum_key: AccumulatorKey {
                    z: *keypair.public_key(),
                },
            },
            tails_location,
            tails_hash,
        },
    };
    let rev_reg_def_private = RevocationRegistryDefinitionPrivate {
        value: RevocationRegistryDefinitionValuePrivate { gamma },
    };
    debug!(
        "Created revocation registry with tails hash {}",
        rev_reg_def.value.tails_hash
    );
    Ok((rev_reg_def, rev_reg_def_private))
}

fn registry_keypair(
    rev_reg_def: &RevocationRegistryDefinition,
    rev_reg_def_private: &RevocationRegistryDefinitionPrivate,
) -> Result<KeyPair> {
    let keypair = rev_reg_def_private.keypair();
    if keypair.public_key() != rev_reg_def.accum_key() {
        return Err(err_msg!(
            KeyMismatch,
            "Registry private key does not match the registry definition"
        ));
    }
    Ok(keypair)
}

fn check_indices<'i>(
    indices: impl IntoIterator<Item = &'i u32>,
    max_cred_num: u32,
) -> Result<()> {
    for idx in indices {
        if *idx == 0 || *idx > max_cred_num {
            return Err(err_msg!(
                IndexOutOfRange,
                "Registry index {} is outside of 1..={}",
                idx,
                max_cred_num
            ));
        }
    }
    Ok(())
}

fn check_timestamp(prev: &RevocationStatusList, timestamp: u64) -> Result<()> {
    match prev.latest_timestamp() {
        Some(prev_ts) if timestamp <= prev_ts => Err(err_msg!(
            NonMonotonicTimestamp,
            "Timestamp {} does not follow the previous status list at {}",
            timestamp,
            prev_ts
        )),
        _ => Ok(()),
    }
}

/// Create the first status list of a registry. With `issuance_by_default` every index
/// starts out issued, otherwise every index starts out revoked.
pub fn create_revocation_status_list(
    rev_reg_def_id: RevocationRegistryDefinitionId,
    rev_reg_def: &RevocationRegistryDefinition,
    rev_reg_def_private: &RevocationRegistryDefinitionPrivate,
    issuance_by_default: bool,
    timestamp: Option<u64>,
) -> Result<RevocationStatusList> {
    trace!(
        "create_revocation_status_list >>> rev_reg_def_id: {}, issuance_by_default: {}, timestamp: {:?}",
        rev_reg_def_id,
        issuance_by_default,
        timestamp
    );
    let keypair = registry_keypair(rev_reg_def, rev_reg_def_private)?;
    let max_cred_num = rev_reg_def.max_cred_num();
    let mut list = RevocationStatusList {
        issuer_id: rev_reg_def.issuer_id.clone(),
        rev_reg_def_id,
        revocation_list: vec![!issuance_by_default; max_cred_num as usize],
        accum: None,
        timestamp,
        prev_timestamp: None,
    };
    let accum = if issuance_by_default {
        Accumulator::initial()
    } else {
        Accumulator::from_revoked(&keypair, list.revoked_elements())?
    };
    list.accum = Some(accum);
    Ok(list)
}

/// Produce the next status list with some indices revoked and others restored.
///
/// The accumulator is updated only for the indices whose state changes. A `None`
/// timestamp produces a list without a timestamp, to be assigned with
/// [`update_revocation_status_list_timestamp_only`] before publishing. Such a list
/// remembers the latest timestamp of its predecessors, and later timestamps must
/// still exceed it.
pub fn update_revocation_status_list(
    rev_reg_def: &RevocationRegistryDefinition,
    rev_reg_def_private: &RevocationRegistryDefinitionPrivate,
    prev: &RevocationStatusList,
    issued: Option<BTreeSet<u32>>,
    revoked: Option<BTreeSet<u32>>,
    timestamp: Option<u64>,
) -> Result<RevocationStatusList> {
    trace!(
        "update_revocation_status_list >>> rev_reg_def_id: {}, issued: {:?}, revoked: {:?}, timestamp: {:?}",
        prev.rev_reg_def_id,
        issued,
        revoked,
        timestamp
    );
    let keypair = registry_keypair(rev_reg_def, rev_reg_def_private)?;
    let max_cred_num = rev_reg_def.max_cred_num();
    if prev.max_cred_num() != max_cred_num {
        return Err(err_msg!(
            InvalidState,
            "Status list size does not match the registry definition"
        ));
    }
    let issued = issued.unwrap_or_default();
    let revoked = revoked.unwrap_or_default();
    check_indices(issued.iter().chain(revoked.iter()), max_cred_num)?;
    if let Some(idx) = issued.intersection(&revoked).next() {
        return Err(err_msg!(
            "Registry index {} cannot be both issued and revoked",
            idx
        ));
    }
    if let Some(ts) = timestamp {
        check_timestamp(prev, ts)?;
    }
    let prev_accum = prev
        .accum
        .ok_or_else(|| err_msg!(InvalidState, "Status list has no accumulator"))?;

    let mut next = prev.clone();
    let mut added: Vec<Scalar> = Vec::new();
    let mut removed: Vec<Scalar> = Vec::new();
    for idx in revoked.iter().copied() {
        if prev.is_revoked(idx) == Some(false) {
            next.revocation_list[idx as usize - 1] = true;
            added.push(registry_element(prev.rev_reg_def_id.as_str(), idx));
        }
    }
    for idx in issued.iter().copied() {
        if prev.is_revoked(idx) == Some(true) {
            next.revocation_list[idx as usize - 1] = false;
            removed.push(registry_element(prev.rev_reg_def_id.as_str(), idx));
        }
    }
    next.accum = Some(prev_accum.update(&keypair, &added, &removed)?);
    next.timestamp = timestamp;
    next.prev_timestamp = match timestamp {
        Some(_) => None,
        None => prev.latest_timestamp(),
    };
    debug!(
        "Updated status list: {} revoked, {} restored",
        added.len(),
        removed.len()
    );
    Ok(next)
}

/// Assign a new timestamp to an otherwise unchanged status list
pub fn update_revocation_status_list_timestamp_only(
    timestamp: u64,
    prev: &RevocationStatusList,
) -> Result<RevocationStatusList> {
    check_timestamp(prev, timestamp)?;
    let mut next = prev.clone();
    next.timestamp = Some(timestamp);
    next.prev_timestamp = None;
    Ok(next)
}

/// Sign a credential over the holder's blinded link secret and the attribute values
pub fn create_credential(
    cred_def: &CredentialDefinition,
    cred_def_private: &CredentialDefinitionPrivate,
    cred_offer: &CredentialOffer,
    cred_request: &CredentialRequest,
    cred_values: CredentialValues,
    revocation_config: Option<CredentialRevocationConfig>,
) -> Result<Credential> {
    trace!(
        "create_credential >>> cred_def_id: {}, revocation: {}",
        cred_offer.cred_def_id,
        revocation_config.is_some()
    );
    if cred_request.cred_def_id != cred_offer.cred_def_id {
        return Err(err_msg!(
            "Credential request does not match the credential offer"
        ));
    }
    let nonce = cred_offer
        .nonce
        .as_ref()
        .ok_or_else(|| err_msg!(MalformedOffer, "Credential offer is missing a nonce"))?;

    let keypair = cred_def_private.keypair();
    if keypair.public_key() != cred_def.public_key() {
        return Err(err_msg!(
            KeyMismatch,
            "Credential definition private key does not match the public key"
        ));
    }
    let gens = cred_def.generators();
    verify_blinded_link_secret(cred_request, &gens, nonce)?;

    let attr_values = ordered_values(cred_def, &cred_values)?;

    let revocation = match (cred_def.support_revocation(), revocation_config) {
        (true, None) => {
            return Err(err_msg!(
                RevocationConfigRequired,
                "Credential definition requires a revocation registry"
            ))
        }
        (false, Some(_)) => {
            return Err(err_msg!(
                RevocationNotSupported,
                "Credential definition does not support revocation"
            ))
        }
        (true, Some(config)) => Some(issue_revocation(&cred_offer.cred_def_id, config)?),
        (false, None) => None,
    };

    let mut signer =
        SignatureMessages::signer_from_commitment(cred_request.blinded_ms, &gens, &keypair);
    signer.push_committed_count(1)?;
    for encoded in attr_values.iter() {
        signer.push(encoded_to_message(encoded)?)?;
    }
    if let Some(rev) = revocation.as_ref() {
        signer.push(registry_id_message(rev.rev_reg_def_id.as_str()).into())?;
        signer.push(rev.element.into())?;
    }
    let signature = signer.sign()?;

    let (rev_reg_id, rev_reg_index, rev_reg, witness) = match revocation {
        Some(rev) => (
            Some(rev.rev_reg_def_id),
            Some(rev.index),
            Some(RevocationRegistry { accum: rev.accum }),
            Some(rev.witness),
        ),
        None => (None, None, None, None),
    };
    debug!("Issued credential for {}", cred_offer.cred_def_id);
    Ok(Credential {
        schema_id: cred_offer.schema_id.clone(),
        cred_def_id: cred_offer.cred_def_id.clone(),
        rev_reg_id,
        values: cred_values,
        signature,
        rev_reg_index,
        rev_reg,
        witness,
    })
}

fn verify_blinded_link_secret(
    cred_request: &CredentialRequest,
    gens: &DynGenerators,
    nonce: &Nonce,
) -> Result<()> {
    cred_request
        .blinded_ms_correctness_proof
        .resp
        .verify(
            gens,
            cred_request.blinded_ms,
            [0],
            cred_request.blinded_ms_correctness_proof.c,
            nonce.as_native(),
        )
        .map_err(err_map!("Invalid blinded link secret correctness proof"))
}

/// The encoded attribute values in signing order, requiring exactly the
/// credential definition attributes
fn ordered_values(cred_def: &CredentialDefinition, values: &CredentialValues) -> Result<Vec<String>> {
    let attrs = cred_def.attr_names();
    if values.0.len() != attrs.len() {
        return Err(err_msg!(
            UnknownAttribute,
            "Expected {} attribute values, found {}",
            attrs.len(),
            values.0.len()
        ));
    }
    for name in values.0.keys() {
        if cred_def.attr_index(name).is_none() {
            return Err(err_msg!(UnknownAttribute, "Unknown attribute: {}", name));
        }
    }
    attrs
        .iter()
        .map(|attr| {
            values
                .get(attr)
                .map(|value| value.encoded.clone())
                .ok_or_else(|| err_msg!(UnknownAttribute, "Missing attribute value: {}", attr))
        })
        .collect()
}

struct IssuedRevocation {
    rev_reg_def_id: RevocationRegistryDefinitionId,
    index: u32,
    element: Scalar,
    accum: Accumulator,
    witness: NonMembershipWitness,
}

fn issue_revocation(
    cred_def_id: &CredentialDefinitionId,
    config: CredentialRevocationConfig,
) -> Result<IssuedRevocation> {
    let CredentialRevocationConfig {
        reg_def_id,
        reg_def,
        reg_def_private,
        status_list,
        registry_idx,
    } = config;
    if &reg_def.cred_def_id != cred_def_id {
        return Err(err_msg!(
            InvalidState,
            "Revocation registry {} is defined for {}, not {}",
            reg_def_id,
            reg_def.cred_def_id,
            cred_def_id
        ));
    }
    if &status_list.rev_reg_def_id != reg_def_id || status_list.issuer_id != reg_def.issuer_id {
        return Err(err_msg!(
            InvalidState,
            "Status list for {} does not belong to revocation registry {}",
            status_list.rev_reg_def_id,
            reg_def_id
        ));
    }
    let max_cred_num = reg_def.max_cred_num();
    if registry_idx > max_cred_num {
        return Err(err_msg!(
            RegistryFull,
            "Registry index {} exceeds the registry size {}",
            registry_idx,
            max_cred_num
        ));
    }
    check_indices([&registry_idx], max_cred_num)?;
    if status_list.max_cred_num() != max_cred_num {
        return Err(err_msg!(
            InvalidState,
            "Status list size does not match the registry definition"
        ));
    }
    if status_list.is_revoked(registry_idx) != Some(false) {
        return Err(err_msg!(
            InvalidState,
            "Registry index {} is revoked in the status list",
            registry_idx
        ));
    }
    let keypair = registry_keypair(reg_def, reg_def_private)?;
    let accum = status_list
        .accum
        .ok_or_else(|| err_msg!(InvalidState, "Status list has no accumulator"))?;
    let element = registry_element(reg_def_id.as_str(), registry_idx);
    let witness =
        NonMembershipWitness::issue(&keypair, &accum, &element, status_list.revoked_elements())?;
    Ok(IssuedRevocation {
        rev_reg_def_id: reg_def_id.clone(),
        index: registry_idx,
        element,
        accum,
        witness,
    })
}
