use std::collections::{BTreeMap, BTreeSet};

use anoncreds_clsig::{
    bls12_381::Scalar, registry_id_message, CreateChallenge, NonRevocationVerifier,
    ProofChallenge, RangeProofVerifier, SignatureProof, VerifierMessages,
};

use super::{
    helpers::{
        attr_common_view, credential_tags, encode_credential_attribute, encoded_to_message,
        restriction_matches,
    },
    types::NonRevokedIntervalOverride,
    PRESENTATION_DST,
};
use crate::{
    data_types::{
        cred_def::{CredentialDefinition, CredentialDefinitionId},
        pres_request::{NonRevokedInterval, PresentationRequest},
        presentation::{Identifier, Presentation, RequestedProof, SubProof},
        rev_reg_def::{RevocationRegistryDefinition, RevocationRegistryDefinitionId},
        rev_status_list::RevocationStatusList,
        schema::{Schema, SchemaId},
    },
    error::Result,
};

/// Verify a presentation against the request it answers.
///
/// Schemas, credential definitions, registry definitions and status lists are supplied
/// by the verifier. Any failed check is reported as `VerificationFailed`.
pub fn verify_presentation(
    presentation: &Presentation,
    pres_req: &PresentationRequest,
    schemas: &BTreeMap<SchemaId, Schema>,
    cred_defs: &BTreeMap<CredentialDefinitionId, CredentialDefinition>,
    rev_reg_defs: Option<&BTreeMap<RevocationRegistryDefinitionId, RevocationRegistryDefinition>>,
    rev_status_lists: Option<&[RevocationStatusList]>,
    nonrevoke_interval_override: Option<&[NonRevokedIntervalOverride]>,
) -> Result<()> {
    trace!(
        "verify_presentation >>> name: {:?}, sub-proofs: {}",
        pres_req.name,
        presentation.proof.proofs.len()
    );
    let context = VerifyContext {
        presentation,
        pres_req,
        schemas,
        cred_defs,
        rev_reg_defs,
        rev_status_lists: rev_status_lists.unwrap_or_default(),
        overrides: nonrevoke_interval_override.unwrap_or_default(),
    };
    match context.verify() {
        Ok(()) => {
            debug!("Verified presentation: {:?}", pres_req.name);
            Ok(())
        }
        Err(err) => {
            debug!("Presentation verification failed: {}", err);
            Err(err_msg!(VerificationFailed))
        }
    }
}

struct VerifyContext<'a> {
    presentation: &'a Presentation,
    pres_req: &'a PresentationRequest,
    schemas: &'a BTreeMap<SchemaId, Schema>,
    cred_defs: &'a BTreeMap<CredentialDefinitionId, CredentialDefinition>,
    rev_reg_defs:
        Option<&'a BTreeMap<RevocationRegistryDefinitionId, RevocationRegistryDefinition>>,
    rev_status_lists: &'a [RevocationStatusList],
    overrides: &'a [NonRevokedIntervalOverride],
}

/// The requested items resolved by a single sub-proof
#[derive(Default)]
struct SubProofRequest<'a> {
    revealed: BTreeMap<&'a str, (&'a str, &'a str)>,
    unrevealed: Vec<&'a str>,
    predicates: Vec<&'a str>,
    restricted: Vec<&'a str>,
    intervals: Vec<&'a NonRevokedInterval>,
}

struct SubProofCheck<'p> {
    eq_proof: &'p SignatureProof,
    non_revocation: Option<NonRevocationVerifier<'p>>,
    predicates: Vec<RangeProofVerifier<'p>>,
}

impl<'p> SubProofCheck<'p> {
    fn push_challenge_inputs<'c>(&'c self, inputs: &mut Vec<&'c dyn CreateChallenge>) {
        inputs.push(self.eq_proof);
        if let Some(non_revocation) = self.non_revocation.as_ref() {
            inputs.push(non_revocation);
        }
        for pred in self.predicates.iter() {
            inputs.push(pred);
        }
    }
}

impl<'a> VerifyContext<'a> {
    fn verify(&self) -> Result<()> {
        self.pres_req.validate()?;
        let proofs = &self.presentation.proof.proofs;
        if self.presentation.identifiers.len() != proofs.len() {
            return Err(err_msg!(
                VerificationFailed,
                "Number of identifiers does not match the number of sub-proofs"
            ));
        }
        let requests = self.check_requested_proof()?;
        let challenge = self.presentation.proof.aggregated_proof.c_hash;

        let mut checks = Vec::with_capacity(proofs.len());
        let mut link_secret_resp: Option<Scalar> = None;
        for (index, (sub_proof, request)) in proofs.iter().zip(requests.iter()).enumerate() {
            let (check, ls_resp) = self.verify_sub_proof(
                index,
                sub_proof,
                &self.presentation.identifiers[index],
                request,
                challenge,
            )?;
            match link_secret_resp {
                Some(resp) if resp != ls_resp => {
                    return Err(err_msg!(
                        VerificationFailed,
                        "Sub-proofs are not bound to the same link secret"
                    ))
                }
                _ => link_secret_resp = Some(ls_resp),
            }
            checks.push(check);
        }

        let mut inputs: Vec<&dyn CreateChallenge> = Vec::new();
        for (identifier, check) in self.presentation.identifiers.iter().zip(checks.iter()) {
            inputs.push(identifier);
            check.push_challenge_inputs(&mut inputs);
        }
        let expected = ProofChallenge::create(
            &inputs,
            self.pres_req.nonce.as_native(),
            Some(PRESENTATION_DST),
        )?;
        if expected != challenge {
            return Err(err_msg!(VerificationFailed, "Proof challenge mismatch"));
        }
        Ok(())
    }

    /// Check that every referent is resolved exactly once and group the resolved items
    /// by sub-proof
    fn check_requested_proof(&self) -> Result<Vec<SubProofRequest<'a>>> {
        let requested: &'a RequestedProof = &self.presentation.requested_proof;
        let pres_req = self.pres_req;
        let proof_count = self.presentation.proof.proofs.len();
        let mut requests: Vec<SubProofRequest<'a>> =
            (0..proof_count).map(|_| SubProofRequest::default()).collect();
        let sub_request = |index: u32| -> Result<usize> {
            let index = index as usize;
            if index >= proof_count {
                Err(err_msg!(
                    VerificationFailed,
                    "Sub-proof index {} is out of range",
                    index
                ))
            } else {
                Ok(index)
            }
        };

        let attr_referents = requested
            .revealed_attrs
            .keys()
            .chain(requested.revealed_attr_groups.keys())
            .chain(requested.unrevealed_attrs.keys())
            .chain(requested.self_attested_attrs.keys());
        let mut seen = BTreeSet::new();
        for referent in attr_referents {
            if !pres_req.requested_attributes.contains_key(referent) {
                return Err(err_msg!(
                    VerificationFailed,
                    "Unexpected attribute referent: {}",
                    referent
                ));
            }
            if !seen.insert(referent.as_str()) {
                return Err(err_msg!(
                    VerificationFailed,
                    "Attribute referent {} is resolved more than once",
                    referent
                ));
            }
        }
        for referent in pres_req.requested_attributes.keys() {
            if !seen.contains(referent.as_str()) {
                return Err(err_msg!(
                    VerificationFailed,
                    "Attribute referent {} is not resolved",
                    referent
                ));
            }
        }
        for referent in requested.predicates.keys() {
            if !pres_req.requested_predicates.contains_key(referent) {
                return Err(err_msg!(
                    VerificationFailed,
                    "Unexpected predicate referent: {}",
                    referent
                ));
            }
        }
        for referent in pres_req.requested_predicates.keys() {
            if !requested.predicates.contains_key(referent) {
                return Err(err_msg!(
                    VerificationFailed,
                    "Predicate referent {} is not resolved",
                    referent
                ));
            }
        }

        for (referent, info) in pres_req.requested_attributes.iter() {
            let referent = referent.as_str();
            if requested.self_attested_attrs.contains_key(referent) {
                if info.restrictions.is_some() || info.is_group() {
                    return Err(err_msg!(
                        VerificationFailed,
                        "Referent {} cannot be self-attested",
                        referent
                    ));
                }
                continue;
            }
            let index = requested
                .sub_proof_index(referent)
                .ok_or_else(|| err_msg!(VerificationFailed, "Unresolved referent {}", referent))?;
            let request = &mut requests[sub_request(index)?];
            if let Some(revealed) = requested.revealed_attrs.get(referent) {
                let name = info.name.as_deref().ok_or_else(|| {
                    err_msg!(
                        VerificationFailed,
                        "Referent {} is revealed as a single attribute",
                        referent
                    )
                })?;
                insert_revealed(
                    request,
                    name,
                    (revealed.raw.as_str(), revealed.encoded.as_str()),
                )?;
            } else if let Some(group) = requested.revealed_attr_groups.get(referent) {
                let names = info.attr_names();
                if !info.is_group() || group.values.len() != names.len() {
                    return Err(err_msg!(
                        VerificationFailed,
                        "Revealed group {} does not match the request",
                        referent
                    ));
                }
                for name in names {
                    let value = group.values.get(name).ok_or_else(|| {
                        err_msg!(
                            VerificationFailed,
                            "Revealed group {} is missing {}",
                            referent,
                            name
                        )
                    })?;
                    insert_revealed(request, name, (value.raw.as_str(), value.encoded.as_str()))?;
                }
            } else {
                request.unrevealed.extend(info.attr_names());
            }
            if info.restrictions.is_some() {
                request.restricted.push(referent);
            }
            if let Some(interval) = pres_req.attribute_interval(referent) {
                request.intervals.push(interval);
            }
        }

        for (referent, info) in pres_req.requested_predicates.iter() {
            let referent = referent.as_str();
            let index = requested
                .sub_proof_index(referent)
                .ok_or_else(|| err_msg!(VerificationFailed, "Unresolved referent {}", referent))?;
            let request = &mut requests[sub_request(index)?];
            request.predicates.push(referent);
            if info.restrictions.is_some() {
                request.restricted.push(referent);
            }
            if let Some(interval) = pres_req.predicate_interval(referent) {
                request.intervals.push(interval);
            }
        }

        Ok(requests)
    }

    fn verify_sub_proof(
        &self,
        index: usize,
        sub_proof: &'a SubProof,
        identifier: &Identifier,
        request: &SubProofRequest<'a>,
        challenge: ProofChallenge,
    ) -> Result<(SubProofCheck<'a>, Scalar)> {
        let schema = self.schemas.get(&identifier.schema_id).ok_or_else(|| {
            err_msg!(
                VerificationFailed,
                "Schema not provided: {}",
                identifier.schema_id
            )
        })?;
        let cred_def = self.cred_defs.get(&identifier.cred_def_id).ok_or_else(|| {
            err_msg!(
                VerificationFailed,
                "Credential definition not provided: {}",
                identifier.cred_def_id
            )
        })?;
        if cred_def.schema_id != identifier.schema_id {
            return Err(err_msg!(
                VerificationFailed,
                "Credential definition {} does not belong to schema {}",
                identifier.cred_def_id,
                identifier.schema_id
            ));
        }

        let tags = credential_tags(
            &identifier.schema_id,
            schema,
            &identifier.cred_def_id,
            cred_def,
            identifier.rev_reg_id.as_ref(),
            request
                .revealed
                .iter()
                .map(|(name, (raw, _))| (*name, *raw)),
        );
        for referent in request.restricted.iter() {
            let restrictions = self
                .pres_req
                .requested_attributes
                .get(*referent)
                .and_then(|info| info.restrictions.as_ref())
                .or_else(|| {
                    self.pres_req
                        .requested_predicates
                        .get(*referent)
                        .and_then(|info| info.restrictions.as_ref())
                });
            if let Some(query) = restrictions {
                if !restriction_matches(query, &tags) {
                    return Err(err_msg!(
                        VerificationFailed,
                        "Restrictions not satisfied for referent {}",
                        referent
                    ));
                }
            }
        }

        let mut revealed = BTreeMap::new();
        for (name, (raw, encoded)) in request.revealed.iter() {
            let attr_idx = cred_def.attr_index(name).ok_or_else(|| {
                err_msg!(VerificationFailed, "Unknown revealed attribute {}", name)
            })?;
            if encode_credential_attribute(raw)? != *encoded {
                return Err(err_msg!(
                    VerificationFailed,
                    "Revealed value for {} does not match its encoding",
                    name
                ));
            }
            revealed.insert(attr_idx, encoded_to_message(encoded)?);
        }
        for name in request.unrevealed.iter() {
            if cred_def.attr_index(name).is_none() {
                return Err(err_msg!(
                    VerificationFailed,
                    "Unknown unrevealed attribute {}",
                    name
                ));
            }
        }

        let gens = cred_def.generators();
        let mut messages = VerifierMessages::new(&gens);
        messages.push_hidden_count(1)?;
        for attr_idx in 0..cred_def.attr_names().len() {
            match revealed.get(&attr_idx) {
                Some(message) => messages.push_revealed(*message)?,
                None => messages.push_hidden_count(1)?,
            }
        }
        match (cred_def.support_revocation(), identifier.rev_reg_id.as_ref()) {
            (true, Some(rev_reg_id)) => {
                messages.push_revealed(registry_id_message(rev_reg_id.as_str()).into())?;
                messages.push_hidden_count(1)?;
            }
            (false, None) => (),
            _ => {
                return Err(err_msg!(
                    VerificationFailed,
                    "Revocation registry id does not match the credential definition in sub-proof {}",
                    index
                ))
            }
        }
        let eq_proof = &sub_proof.primary_proof.eq_proof;
        if !eq_proof.verify(cred_def.public_key(), &messages, challenge)? {
            return Err(err_msg!(
                VerificationFailed,
                "Signature proof failed for sub-proof {}",
                index
            ));
        }
        let hidden_response = |msg_idx: usize| {
            eq_proof.hidden_response(&messages, msg_idx).ok_or_else(|| {
                err_msg!(
                    VerificationFailed,
                    "Message {} is not hidden in sub-proof {}",
                    msg_idx,
                    index
                )
            })
        };
        let link_secret_resp = hidden_response(0)?;

        let ge_proofs = &sub_proof.primary_proof.ge_proofs;
        if ge_proofs.len() != request.predicates.len() {
            return Err(err_msg!(
                VerificationFailed,
                "Unexpected number of predicate proofs in sub-proof {}",
                index
            ));
        }
        let mut predicates = Vec::with_capacity(ge_proofs.len());
        for (referent, ge_proof) in request.predicates.iter().zip(ge_proofs.iter()) {
            let info = self
                .pres_req
                .requested_predicates
                .get(*referent)
                .ok_or_else(|| err_msg!(VerificationFailed, "Unknown predicate {}", referent))?;
            if attr_common_view(&ge_proof.attr_name) != attr_common_view(&info.name)
                || ge_proof.p_type != info.p_type
                || ge_proof.p_value != info.p_value
            {
                return Err(err_msg!(
                    VerificationFailed,
                    "Predicate proof does not match the request for {}",
                    referent
                ));
            }
            let attr_idx = cred_def.attr_index(&info.name).ok_or_else(|| {
                err_msg!(VerificationFailed, "Unknown predicate attribute {}", info.name)
            })?;
            let resp = hidden_response(1 + attr_idx)?;
            let verifier =
                ge_proof
                    .proof
                    .verifier(info.p_type, info.p_value.into(), resp, challenge)?;
            verifier.verify()?;
            predicates.push(verifier);
        }

        let non_revocation = match (
            cred_def.revocation_message_index(),
            request.intervals.is_empty(),
        ) {
            (Some(msg_idx), false) => {
                let element_resp = hidden_response(msg_idx)?;
                Some(self.verify_non_revocation(
                    sub_proof,
                    identifier,
                    request,
                    element_resp,
                    challenge,
                )?)
            }
            _ => {
                if sub_proof.non_revoc_proof.is_some() {
                    return Err(err_msg!(
                        VerificationFailed,
                        "Unexpected non-revocation proof in sub-proof {}",
                        index
                    ));
                }
                None
            }
        };

        Ok((
            SubProofCheck {
                eq_proof,
                non_revocation,
                predicates,
            },
            link_secret_resp,
        ))
    }

    fn verify_non_revocation(
        &self,
        sub_proof: &'a SubProof,
        identifier: &Identifier,
        request: &SubProofRequest<'a>,
        element_resp: Scalar,
        challenge: ProofChallenge,
    ) -> Result<NonRevocationVerifier<'a>> {
        let proof = sub_proof
            .non_revoc_proof
            .as_ref()
            .ok_or_else(|| err_msg!(VerificationFailed, "Missing non-revocation proof"))?;
        let rev_reg_id = identifier
            .rev_reg_id
            .as_ref()
            .ok_or_else(|| err_msg!(VerificationFailed, "Missing revocation registry id"))?;
        let timestamp = identifier
            .timestamp
            .ok_or_else(|| err_msg!(VerificationFailed, "Missing non-revocation timestamp"))?;

        for interval in request.intervals.iter() {
            let overridden = self.overrides.iter().find(|ov| {
                &ov.rev_reg_def_id == rev_reg_id && interval.from == Some(ov.requested_from_ts)
            });
            let accepted = match overridden {
                Some(ov) => ov.override_rev_status_list_ts == timestamp,
                None => interval.is_valid(timestamp),
            };
            if !accepted {
                return Err(err_msg!(
                    VerificationFailed,
                    "Timestamp {} is outside of the non-revoked interval",
                    timestamp
                ));
            }
        }

        let rev_reg_def = self
            .rev_reg_defs
            .and_then(|defs| defs.get(rev_reg_id))
            .ok_or_else(|| {
                err_msg!(
                    VerificationFailed,
                    "Revocation registry definition not provided: {}",
                    rev_reg_id
                )
            })?;
        if rev_reg_def.cred_def_id != identifier.cred_def_id {
            return Err(err_msg!(
                VerificationFailed,
                "Revocation registry {} does not belong to {}",
                rev_reg_id,
                identifier.cred_def_id
            ));
        }
        let status_list = self
            .rev_status_lists
            .iter()
            .find(|list| &list.rev_reg_def_id == rev_reg_id && list.timestamp == Some(timestamp))
            .ok_or_else(|| {
                err_msg!(
                    VerificationFailed,
                    "Revocation status list not provided for {} at {}",
                    rev_reg_id,
                    timestamp
                )
            })?;
        let accum = status_list.accum.as_ref().ok_or_else(|| {
            err_msg!(VerificationFailed, "Revocation status list has no accumulator")
        })?;

        let verifier = proof.verifier(accum, element_resp, challenge);
        verifier.verify(rev_reg_def.accum_key())?;
        Ok(verifier)
    }
}

fn insert_revealed<'a>(
    request: &mut SubProofRequest<'a>,
    name: &'a str,
    value: (&'a str, &'a str),
) -> Result<()> {
    match request.revealed.insert(name, value) {
        Some((_, encoded)) if encoded != value.1 => Err(err_msg!(
            VerificationFailed,
            "Conflicting revealed values for {}",
            name
        )),
        _ => Ok(()),
    }
}
