use std::collections::{BTreeMap, BTreeSet};

use anoncreds_clsig::{
    bls12_381::Scalar, registry_element, registry_id_message, Blinding, CommitmentBuilder,
    CreateChallenge, KeyPair, Message, NonMembershipWitness, NonRevocationProof,
    NonRevocationProofContext, ProofChallenge, ProverMessages, RangeProof, RangeProofContext,
    SignatureMessages, SignatureProofContext,
};
use rand::rngs::OsRng;

use super::{
    helpers::{credential_tags, encoded_to_i32, encoded_to_message, restriction_matches},
    tails::TailsFileReader,
    types::{PresentCredential, PresentCredentials},
    PRESENTATION_DST,
};
use crate::{
    data_types::{
        cred_def::{CredentialDefinition, CredentialDefinitionId},
        cred_offer::CredentialOffer,
        cred_request::{
            BlindedLinkSecretCorrectnessProof, CredentialRequest, CredentialRequestMetadata,
        },
        credential::{AttributeValues, Credential, RevocationRegistry},
        link_secret::LinkSecret,
        pres_request::{PredicateType, PresentationRequest},
        presentation::{
            AggregatedProof, Identifier, PredicateProof, Presentation, PrimaryProof, Proof,
            RequestedProof, RevealedAttributeGroupInfo, RevealedAttributeInfo, SubProof,
            SubProofReferent,
        },
        rev_reg_def::RevocationRegistryDefinition,
        rev_state::CredentialRevocationState,
        rev_status_list::RevocationStatusList,
        schema::{Schema, SchemaId},
    },
    error::Result,
    query::Query,
};

/// Create a new random link secret
pub fn create_link_secret() -> Result<LinkSecret> {
    LinkSecret::new()
}

/// Commit to the link secret for a credential offer. The returned metadata holds the
/// commitment blinding and must be kept to process the issued credential.
pub fn create_credential_request(
    entropy: Option<&str>,
    prover_did: Option<&str>,
    cred_def: &CredentialDefinition,
    link_secret: &LinkSecret,
    link_secret_id: &str,
    cred_offer: &CredentialOffer,
) -> Result<(CredentialRequest, CredentialRequestMetadata)> {
    trace!(
        "create_credential_request >>> cred_def_id: {}, link_secret_id: {:?}",
        cred_offer.cred_def_id,
        link_secret_id
    );
    if entropy.is_some() == prover_did.is_some() {
        return Err(err_msg!(
            "Exactly one of prover_did or entropy must be provided"
        ));
    }
    let nonce = cred_offer
        .nonce
        .as_ref()
        .ok_or_else(|| err_msg!(MalformedOffer, "Credential offer is missing a nonce"))?;
    cred_offer
        .key_correctness_proof
        .verify(cred_def.public_key(), cred_def.message_count())
        .map_err(err_map!(
            KeyMismatch,
            "Key correctness proof does not match credential definition"
        ))?;

    let gens = cred_def.generators();
    let mut committer = CommitmentBuilder::new(&gens);
    committer.add_message(0, link_secret.as_message())?;
    let (c, blinding, blinded_ms, resp) = committer.complete(nonce.as_native())?;

    let request = CredentialRequest {
        entropy: entropy.map(str::to_string),
        prover_did: prover_did.map(str::to_string),
        cred_def_id: cred_offer.cred_def_id.clone(),
        blinded_ms,
        blinded_ms_correctness_proof: BlindedLinkSecretCorrectnessProof { c, resp },
    };
    let metadata = CredentialRequestMetadata {
        link_secret_blinding_data: blinding,
        link_secret_name: link_secret_id.to_string(),
    };
    Ok((request, metadata))
}

/// The signed messages of a credential after the link secret, in signing order
fn credential_messages(cred_def: &CredentialDefinition, credential: &Credential) -> Result<Vec<Message>> {
    let mut messages = Vec::with_capacity(cred_def.message_count() - 1);
    for attr in cred_def.attr_names() {
        let value = credential.values.get(attr).ok_or_else(|| {
            err_msg!(UnknownAttribute, "Credential is missing a value for {}", attr)
        })?;
        messages.push(encoded_to_message(&value.encoded)?);
    }
    if cred_def.support_revocation() {
        let (registry_id, element) = revocation_messages(credential)?;
        messages.push(registry_id.into());
        messages.push(element.into());
    }
    Ok(messages)
}

/// The signed registry id message and the hidden revocation element of a credential
fn revocation_messages(credential: &Credential) -> Result<(Scalar, Scalar)> {
    match (credential.rev_reg_id.as_ref(), credential.rev_reg_index) {
        (Some(rev_reg_id), Some(index)) => Ok((
            registry_id_message(rev_reg_id.as_str()),
            registry_element(rev_reg_id.as_str(), index),
        )),
        _ => Err(err_msg!(
            InvalidState,
            "Credential is missing its revocation registry index"
        )),
    }
}

/// Unblind a received credential and check its signature and revocation witness
pub fn process_credential(
    credential: &mut Credential,
    cred_request_metadata: &CredentialRequestMetadata,
    link_secret: &LinkSecret,
    cred_def: &CredentialDefinition,
    rev_reg_def: Option<&RevocationRegistryDefinition>,
) -> Result<()> {
    trace!(
        "process_credential >>> cred_def_id: {}, link_secret_name: {:?}",
        credential.cred_def_id,
        cred_request_metadata.link_secret_name
    );
    let signature = credential
        .signature
        .unblind(cred_request_metadata.link_secret_blinding_data);
    let gens = cred_def.generators();
    let keypair = KeyPair::from_public_key(*cred_def.public_key());
    let mut verifier = SignatureMessages::verifier(&gens, &keypair);
    verifier.push(link_secret.as_message())?;
    verifier.append(credential_messages(cred_def, credential)?)?;
    verifier.verify_signature(&signature)?;

    if cred_def.support_revocation() {
        let rev_reg_def = rev_reg_def.ok_or_else(|| {
            err_msg!("Revocation registry definition is required for a revocable credential")
        })?;
        let (witness, rev_reg) = match (credential.witness.as_ref(), credential.rev_reg.as_ref()) {
            (Some(witness), Some(rev_reg)) => (witness, rev_reg),
            _ => {
                return Err(err_msg!(
                    WitnessInvalid,
                    "Credential is missing its revocation witness"
                ))
            }
        };
        let (_, element) = revocation_messages(credential)?;
        witness.verify(
            &element,
            &rev_reg.accum,
            rev_reg_def.accum_key(),
        )?;
    }

    credential.signature = signature;
    debug!("Processed credential for {}", credential.cred_def_id);
    Ok(())
}

/// Compute the witness for a registry index against a status list, updating a previous
/// revocation state where possible
pub fn create_or_update_revocation_state(
    tails_path: &str,
    rev_reg_def: &RevocationRegistryDefinition,
    rev_status_list: &RevocationStatusList,
    rev_reg_idx: u32,
    rev_state: Option<&CredentialRevocationState>,
    old_rev_status_list: Option<&RevocationStatusList>,
) -> Result<CredentialRevocationState> {
    trace!(
        "create_or_update_revocation_state >>> rev_reg_def_id: {}, rev_reg_idx: {}, timestamp: {:?}",
        rev_status_list.rev_reg_def_id,
        rev_reg_idx,
        rev_status_list.timestamp
    );
    let timestamp = rev_status_list
        .timestamp
        .ok_or_else(|| err_msg!("Revocation status list has no timestamp"))?;
    let accum = rev_status_list
        .accum
        .ok_or_else(|| err_msg!(InvalidState, "Revocation status list has no accumulator"))?;
    if rev_status_list.max_cred_num() != rev_reg_def.max_cred_num() {
        return Err(err_msg!(
            InvalidState,
            "Status list size does not match the registry definition"
        ));
    }
    match rev_status_list.is_revoked(rev_reg_idx) {
        None => {
            return Err(err_msg!(
                IndexOutOfRange,
                "Registry index {} is outside of the registry",
                rev_reg_idx
            ))
        }
        Some(true) => {
            return Err(err_msg!(
                InvalidState,
                "Registry index {} is revoked",
                rev_reg_idx
            ))
        }
        Some(false) => (),
    }
    let element = registry_element(rev_status_list.rev_reg_def_id.as_str(), rev_reg_idx);

    let updated = match (rev_state, old_rev_status_list) {
        (Some(state), Some(old)) => update_witness(state, old, rev_status_list, &element)?,
        _ => None,
    };
    let witness = match updated {
        Some(witness) => witness,
        None => {
            let reader = TailsFileReader::new(tails_path);
            reader.verify_hash(&rev_reg_def.value.tails_hash)?;
            let mut tails = reader.open()?;
            NonMembershipWitness::from_tails(
                &element,
                &rev_status_list.revoked_elements(),
                &mut tails,
            )?
        }
    };
    witness.verify(&element, &accum, rev_reg_def.accum_key())?;

    Ok(CredentialRevocationState {
        witness,
        rev_reg: RevocationRegistry { accum },
        timestamp,
    })
}

/// Carry a witness across at most one changed index. Other changes need the
/// intermediate accumulator values, so the witness is recomputed from the tails.
fn update_witness(
    state: &CredentialRevocationState,
    old: &RevocationStatusList,
    new: &RevocationStatusList,
    element: &Scalar,
) -> Result<Option<NonMembershipWitness>> {
    if old.rev_reg_def_id != new.rev_reg_def_id
        || old.max_cred_num() != new.max_cred_num()
        || old.accum != Some(state.rev_reg.accum)
    {
        return Ok(None);
    }
    match old.changed_indices(new).as_slice() {
        [] => Ok(Some(state.witness)),
        [idx] => {
            let changed = registry_element(new.rev_reg_def_id.as_str(), *idx);
            let witness = if new.is_revoked(*idx) == Some(true) {
                state
                    .witness
                    .update_revoked(element, &changed, &state.rev_reg.accum)?
            } else {
                let accum = new.accum.ok_or_else(|| {
                    err_msg!(InvalidState, "Revocation status list has no accumulator")
                })?;
                state.witness.update_issued(element, &changed, &accum)?
            };
            trace!("Updated witness for changed index {}", idx);
            Ok(Some(witness))
        }
        _ => Ok(None),
    }
}

/// Check that every requested referent is resolved by exactly one credential or
/// self-attested value
fn check_referents(
    pres_req: &PresentationRequest,
    credentials: &PresentCredentials,
    self_attested: &BTreeMap<String, String>,
) -> Result<()> {
    let mut attr_sources: BTreeMap<&str, usize> = BTreeMap::new();
    let mut pred_sources: BTreeMap<&str, usize> = BTreeMap::new();
    for present in credentials.0.iter() {
        for referent in present.requested_attributes.keys() {
            if !pres_req.requested_attributes.contains_key(referent) {
                return Err(err_msg!("Unknown attribute referent: {}", referent));
            }
            *attr_sources.entry(referent.as_str()).or_default() += 1;
        }
        for referent in present.requested_predicates.iter() {
            if !pres_req.requested_predicates.contains_key(referent) {
                return Err(err_msg!("Unknown predicate referent: {}", referent));
            }
            *pred_sources.entry(referent.as_str()).or_default() += 1;
        }
    }
    for referent in self_attested.keys() {
        let info = pres_req
            .requested_attributes
            .get(referent)
            .ok_or_else(|| err_msg!("Unknown self-attested referent: {}", referent))?;
        if info.restrictions.is_some() || info.is_group() {
            return Err(err_msg!(
                "Referent {} cannot be resolved by a self-attested value",
                referent
            ));
        }
        *attr_sources.entry(referent.as_str()).or_default() += 1;
    }

    let requested = pres_req
        .requested_attributes
        .keys()
        .map(|r| (r, &attr_sources))
        .chain(pres_req.requested_predicates.keys().map(|r| (r, &pred_sources)));
    for (referent, sources) in requested {
        match sources.get(referent.as_str()) {
            Some(1) => (),
            Some(_) => {
                return Err(err_msg!(
                    UnresolvedReferent,
                    "Referent {} is resolved more than once",
                    referent
                ))
            }
            None => {
                return Err(err_msg!(
                    UnresolvedReferent,
                    "Referent {} is not resolved",
                    referent
                ))
            }
        }
    }
    Ok(())
}

struct PredicateContext {
    attr_name: String,
    p_type: PredicateType,
    p_value: i32,
    context: RangeProofContext,
}

struct SubProofContext {
    signature: SignatureProofContext,
    non_revocation: Option<NonRevocationProofContext>,
    predicates: Vec<PredicateContext>,
}

impl SubProofContext {
    fn push_challenge_inputs<'c>(&'c self, inputs: &mut Vec<&'c dyn CreateChallenge>) {
        inputs.push(&self.signature);
        if let Some(non_revocation) = self.non_revocation.as_ref() {
            inputs.push(non_revocation);
        }
        for pred in self.predicates.iter() {
            inputs.push(&pred.context);
        }
    }

    fn complete(&self, challenge: ProofChallenge) -> Result<SubProof> {
        let ge_proofs = self
            .predicates
            .iter()
            .map(|pred| {
                Ok(PredicateProof {
                    attr_name: pred.attr_name.clone(),
                    p_type: pred.p_type,
                    p_value: pred.p_value,
                    proof: pred.context.complete(challenge)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let non_revoc_proof = self
            .non_revocation
            .as_ref()
            .map(|ctx| ctx.complete(challenge))
            .transpose()?;
        Ok(SubProof {
            primary_proof: PrimaryProof {
                eq_proof: self.signature.complete(challenge)?,
                ge_proofs,
            },
            non_revoc_proof,
        })
    }
}

/// Build a presentation from held credentials.
///
/// Every requested referent must be resolved exactly once, either by one of the
/// credentials or by a self-attested value. All sub-proofs share the link secret
/// and a single challenge over the request nonce.
pub fn create_presentation(
    pres_req: &PresentationRequest,
    credentials: PresentCredentials,
    self_attested: Option<BTreeMap<String, String>>,
    link_secret: &LinkSecret,
    schemas: &BTreeMap<SchemaId, Schema>,
    cred_defs: &BTreeMap<CredentialDefinitionId, CredentialDefinition>,
) -> Result<Presentation> {
    trace!(
        "create_presentation >>> name: {:?}, credentials: {}",
        pres_req.name,
        credentials.len()
    );
    pres_req.validate()?;
    let self_attested = self_attested.unwrap_or_default();
    check_referents(pres_req, &credentials, &self_attested)?;

    let link_secret_blinding = Blinding::random_with_rng(OsRng);
    let mut requested_proof = RequestedProof {
        self_attested_attrs: self_attested,
        ..RequestedProof::default()
    };
    let mut identifiers = Vec::new();
    let mut contexts = Vec::new();

    for present in credentials.0.iter().filter(|present| !present.is_empty()) {
        let sub_proof_index = contexts.len() as u32;
        let (identifier, context) = prepare_sub_proof(
            pres_req,
            present,
            sub_proof_index,
            link_secret,
            link_secret_blinding,
            schemas,
            cred_defs,
            &mut requested_proof,
        )?;
        identifiers.push(identifier);
        contexts.push(context);
    }

    let mut inputs: Vec<&dyn CreateChallenge> = Vec::new();
    for (identifier, context) in identifiers.iter().zip(contexts.iter()) {
        inputs.push(identifier);
        context.push_challenge_inputs(&mut inputs);
    }
    let challenge =
        ProofChallenge::create(&inputs, pres_req.nonce.as_native(), Some(PRESENTATION_DST))?;

    let proofs = contexts
        .iter()
        .map(|context| context.complete(challenge))
        .collect::<Result<Vec<_>>>()?;

    debug!("Created presentation with {} sub-proofs", proofs.len());
    Ok(Presentation {
        proof: Proof {
            proofs,
            aggregated_proof: AggregatedProof { c_hash: challenge },
        },
        requested_proof,
        identifiers,
    })
}

fn check_restrictions(
    referent: &str,
    restrictions: Option<&Query>,
    tags: &BTreeMap<String, String>,
) -> Result<()> {
    match restrictions {
        Some(query) if !restriction_matches(query, tags) => Err(err_msg!(
            "Credential does not satisfy the restrictions for referent {}",
            referent
        )),
        _ => Ok(()),
    }
}

fn attribute_value<'c>(
    cred_def: &CredentialDefinition,
    cred: &'c Credential,
    name: &str,
    referent: &str,
) -> Result<(usize, &'c AttributeValues)> {
    let attr_idx = cred_def.attr_index(name).ok_or_else(|| {
        err_msg!("Credential has no attribute {} for referent {}", name, referent)
    })?;
    let value = cred
        .values
        .get(name)
        .ok_or_else(|| err_msg!(UnknownAttribute, "Credential is missing a value for {}", name))?;
    Ok((attr_idx, value))
}

#[allow(clippy::too_many_arguments)]
fn prepare_sub_proof(
    pres_req: &PresentationRequest,
    present: &PresentCredential,
    sub_proof_index: u32,
    link_secret: &LinkSecret,
    link_secret_blinding: Blinding,
    schemas: &BTreeMap<SchemaId, Schema>,
    cred_defs: &BTreeMap<CredentialDefinitionId, CredentialDefinition>,
    requested_proof: &mut RequestedProof,
) -> Result<(Identifier, SubProofContext)> {
    let cred = present.cred;
    let cred_def = cred_defs.get(&cred.cred_def_id).ok_or_else(|| {
        err_msg!("Missing credential definition: {}", cred.cred_def_id)
    })?;
    let schema = schemas
        .get(&cred.schema_id)
        .ok_or_else(|| err_msg!("Missing schema: {}", cred.schema_id))?;
    let tags = credential_tags(
        &cred.schema_id,
        schema,
        &cred.cred_def_id,
        cred_def,
        cred.rev_reg_id.as_ref(),
        cred.values
            .0
            .iter()
            .map(|(name, value)| (name.as_str(), value.raw.as_str())),
    );
    let mut revealed = BTreeSet::new();
    let mut interval_requested = false;
    for (referent, reveal) in present.requested_attributes.iter() {
        let info = pres_req
            .requested_attributes
            .get(referent)
            .ok_or_else(|| err_msg!("Unknown attribute referent: {}", referent))?;
        check_restrictions(referent, info.restrictions.as_ref(), &tags)?;
        interval_requested |= pres_req.attribute_interval(referent).is_some();

        let mut values = BTreeMap::new();
        for name in info.attr_names() {
            let (attr_idx, value) = attribute_value(cred_def, cred, name, referent)?;
            if *reveal {
                revealed.insert(attr_idx);
            }
            values.insert(name.to_string(), value.clone());
        }
        let referent = referent.clone();
        if !*reveal {
            requested_proof
                .unrevealed_attrs
                .insert(referent, SubProofReferent { sub_proof_index });
        } else if info.is_group() {
            requested_proof.revealed_attr_groups.insert(
                referent,
                RevealedAttributeGroupInfo {
                    sub_proof_index,
                    values,
                },
            );
        } else if let Some((_, value)) = values.into_iter().next() {
            requested_proof.revealed_attrs.insert(
                referent,
                RevealedAttributeInfo {
                    sub_proof_index,
                    raw: value.raw,
                    encoded: value.encoded,
                },
            );
        }
    }

    let mut predicates = Vec::with_capacity(present.requested_predicates.len());
    for referent in present.requested_predicates.iter() {
        let info = pres_req
            .requested_predicates
            .get(referent)
            .ok_or_else(|| err_msg!("Unknown predicate referent: {}", referent))?;
        check_restrictions(referent, info.restrictions.as_ref(), &tags)?;
        interval_requested |= pres_req.predicate_interval(referent).is_some();

        let (attr_idx, value) = attribute_value(cred_def, cred, &info.name, referent)?;
        if revealed.contains(&attr_idx) {
            return Err(err_msg!(
                "Predicate attribute {} is also revealed by the credential",
                info.name
            ));
        }
        let value = encoded_to_i32(&value.encoded)?;
        if !info.p_type.check(value.into(), info.p_value.into()) {
            return Err(err_msg!(
                "Predicate is not satisfied for referent {}",
                referent
            ));
        }
        requested_proof
            .predicates
            .insert(referent.clone(), SubProofReferent { sub_proof_index });
        predicates.push((attr_idx, info, value));
    }

    let gens = cred_def.generators();
    let mut messages = ProverMessages::new(&gens);
    messages.push_hidden_with(link_secret.as_message(), link_secret_blinding)?;
    let mut blindings = BTreeMap::new();
    for (attr_idx, message) in credential_messages(cred_def, cred)?
        .into_iter()
        .take(cred_def.attr_names().len())
        .enumerate()
    {
        if revealed.contains(&attr_idx) {
            messages.push_revealed(message)?;
        } else {
            let blinding = Blinding::random_with_rng(OsRng);
            messages.push_hidden_with(message, blinding)?;
            blindings.insert(attr_idx, blinding);
        }
    }

    let mut non_revocation = None;
    let mut timestamp = None;
    if cred_def.support_revocation() {
        let (registry_id, element) = revocation_messages(cred)?;
        let element_blinding = Blinding::random_with_rng(OsRng);
        messages.push_revealed(registry_id.into())?;
        messages.push_hidden_with(element.into(), element_blinding)?;
        if interval_requested {
            let rev_state = present.rev_state.ok_or_else(|| {
                err_msg!(
                    "Revocation state is required for credential {}",
                    cred.cred_def_id
                )
            })?;
            let ts = present.timestamp.ok_or_else(|| {
                err_msg!(
                    "Timestamp is required for credential {}",
                    cred.cred_def_id
                )
            })?;
            non_revocation = Some(NonRevocationProof::prepare_with_rng(
                &rev_state.witness,
                &rev_state.rev_reg.accum,
                &element,
                element_blinding,
                OsRng,
            )?);
            timestamp = Some(ts);
        }
    }
    let signature = messages.prepare_with_rng(&cred.signature, OsRng)?;

    let predicates = predicates
        .into_iter()
        .map(|(attr_idx, info, value)| {
            let blinding = blindings
                .get(&attr_idx)
                .copied()
                .ok_or_else(|| err_msg!(Unexpected, "Missing predicate attribute blinding"))?;
            let context = RangeProof::prepare_with_rng(
                value.into(),
                info.p_type,
                info.p_value.into(),
                blinding,
                OsRng,
            )?;
            Ok(PredicateContext {
                attr_name: info.name.clone(),
                p_type: info.p_type,
                p_value: info.p_value,
                context,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let identifier = Identifier {
        schema_id: cred.schema_id.clone(),
        cred_def_id: cred.cred_def_id.clone(),
        rev_reg_id: cred.rev_reg_id.clone(),
        timestamp,
    };
    Ok((
        identifier,
        SubProofContext {
            signature,
            non_revocation,
            predicates,
        },
    ))
}
