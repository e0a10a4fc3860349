use std::collections::{BTreeMap, BTreeSet};

use anoncreds::{
    data_types::{
        cred_def::{
            CredentialDefinition, CredentialDefinitionId, CredentialDefinitionPrivate,
            CredentialKeyCorrectnessProof,
        },
        cred_request::CredentialRequestMetadata,
        credential::{Credential, RevocationRegistry},
        link_secret::LinkSecret,
        pres_request::PresentationRequest,
        presentation::Presentation,
        rev_reg_def::{
            RevocationRegistryDefinition, RevocationRegistryDefinitionId,
            RevocationRegistryDefinitionPrivate,
        },
        rev_state::CredentialRevocationState,
        rev_status_list::RevocationStatusList,
        schema::{Schema, SchemaId},
        JsonObject,
    },
    helpers::encode_credential_attributes,
    issuer, prover,
    tails::TailsFileWriter,
    types::{
        CredentialDefinitionConfig, CredentialRevocationConfig, MakeCredentialValues,
        NonRevokedIntervalOverride, PresentCredentials, RegistryType, SignatureType,
    },
    verifier, ErrorKind,
};

const ERR_CREATE_CRED: &str = "Error creating credential";
const ERR_CREATE_PRES: &str = "Error creating presentation";
const ERR_PROCESS_CRED: &str = "Error processing credential";
const ERR_REV_STATE: &str = "Error creating revocation state";
const ERR_STATUS_LIST: &str = "Error updating revocation status list";

const SCHEMA_ID: &str = "mock:uri:schema";
const CRED_DEF_ID: &str = "mock:uri:creddef";
const REV_REG_ID: &str = "mock:uri:revregdef";
const ISSUER_ID: &str = "mock:issuer";

type RevocationRegistryDefinitions =
    BTreeMap<RevocationRegistryDefinitionId, RevocationRegistryDefinition>;

struct Issuer {
    schema: Schema,
    cred_def: CredentialDefinition,
    cred_def_private: CredentialDefinitionPrivate,
    key_proof: CredentialKeyCorrectnessProof,
    revocation: Option<(RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate)>,
}

impl Issuer {
    fn new(attrs: &[&str], max_cred_num: Option<u32>) -> Self {
        let schema = issuer::create_schema("gvt", "1.0", ISSUER_ID.into(), attrs.into())
            .expect("Error creating schema");
        let (cred_def, cred_def_private, key_proof) = issuer::create_credential_definition(
            SCHEMA_ID.into(),
            &schema,
            ISSUER_ID.into(),
            "tag",
            SignatureType::CL,
            CredentialDefinitionConfig::new(max_cred_num.is_some()),
        )
        .expect("Error creating credential definition");
        let revocation = max_cred_num.map(|max_cred_num| {
            let mut tails_writer = TailsFileWriter::new(None);
            issuer::create_revocation_registry_def(
                &cred_def,
                CRED_DEF_ID.into(),
                ISSUER_ID.into(),
                "default",
                RegistryType::CL_ACCUM,
                max_cred_num,
                &mut tails_writer,
            )
            .expect("Error creating revocation registry")
        });
        Self {
            schema,
            cred_def,
            cred_def_private,
            key_proof,
            revocation,
        }
    }

    fn rev_reg_def(&self) -> &RevocationRegistryDefinition {
        &self.revocation.as_ref().expect("Registry not defined").0
    }

    fn status_list(&self, timestamp: u64) -> RevocationStatusList {
        let (rev_reg_def, rev_reg_def_private) =
            self.revocation.as_ref().expect("Registry not defined");
        issuer::create_revocation_status_list(
            REV_REG_ID.into(),
            rev_reg_def,
            rev_reg_def_private,
            true,
            Some(timestamp),
        )
        .expect("Error creating revocation status list")
    }

    fn revoke(
        &self,
        prev: &RevocationStatusList,
        revoked: &[u32],
        timestamp: u64,
    ) -> RevocationStatusList {
        let (rev_reg_def, rev_reg_def_private) =
            self.revocation.as_ref().expect("Registry not defined");
        issuer::update_revocation_status_list(
            rev_reg_def,
            rev_reg_def_private,
            prev,
            None,
            Some(revoked.iter().copied().collect()),
            Some(timestamp),
        )
        .expect(ERR_STATUS_LIST)
    }

    fn schemas(&self) -> BTreeMap<SchemaId, Schema> {
        BTreeMap::from([(SCHEMA_ID.into(), self.schema.clone())])
    }

    fn cred_defs(&self) -> BTreeMap<CredentialDefinitionId, CredentialDefinition> {
        BTreeMap::from([(CRED_DEF_ID.into(), self.cred_def.clone())])
    }

    fn rev_reg_defs(&self) -> RevocationRegistryDefinitions {
        BTreeMap::from([(REV_REG_ID.into(), self.rev_reg_def().clone())])
    }

    /// Run the offer, request, issue and process exchange with a holder
    fn issue(
        &self,
        link_secret: &LinkSecret,
        values: &[(&str, &str)],
        revocation: Option<(&RevocationStatusList, u32)>,
    ) -> Credential {
        let rev_reg_def_id = RevocationRegistryDefinitionId::from(REV_REG_ID);
        let rev_config = revocation.map(|(status_list, registry_idx)| {
            let (reg_def, reg_def_private) =
                self.revocation.as_ref().expect("Registry not defined");
            CredentialRevocationConfig::new(
                &rev_reg_def_id,
                reg_def,
                reg_def_private,
                status_list,
                registry_idx,
            )
        });
        let (mut credential, metadata) = self
            .try_create_credential(link_secret, values, rev_config)
            .expect(ERR_CREATE_CRED);
        prover::process_credential(
            &mut credential,
            &metadata,
            link_secret,
            &self.cred_def,
            self.revocation.as_ref().map(|(def, _)| def),
        )
        .expect(ERR_PROCESS_CRED);
        credential
    }

    /// Run the offer and request exchange, then sign without processing
    fn try_create_credential(
        &self,
        link_secret: &LinkSecret,
        values: &[(&str, &str)],
        rev_config: Option<CredentialRevocationConfig>,
    ) -> anoncreds::Result<(Credential, CredentialRequestMetadata)> {
        let offer = issuer::create_credential_offer(
            SCHEMA_ID.into(),
            CRED_DEF_ID.into(),
            &self.cred_def,
            &self.key_proof,
        )
        .expect("Error creating credential offer");
        let (request, metadata) = prover::create_credential_request(
            Some("entropy"),
            None,
            &self.cred_def,
            link_secret,
            "default",
            &offer,
        )
        .expect("Error creating credential request");

        let mut cred_values = MakeCredentialValues::default();
        for (name, raw) in values {
            cred_values
                .add_raw(*name, *raw)
                .expect("Error encoding value");
        }
        let credential = issuer::create_credential(
            &self.cred_def,
            &self.cred_def_private,
            &offer,
            &request,
            cred_values.into(),
            rev_config,
        )?;
        Ok((credential, metadata))
    }
}

fn gvt_values() -> Vec<(&'static str, &'static str)> {
    vec![
        ("name", "Alex"),
        ("age", "28"),
        ("sex", "male"),
        ("height", "175"),
    ]
}

fn request(json: serde_json::Value) -> PresentationRequest {
    PresentationRequest::from_json(json.to_string()).expect("Error parsing request")
}

fn predicate_request(p_value: i32) -> PresentationRequest {
    request(serde_json::json!({
        "nonce": "123432421212",
        "name": "pres_req_1",
        "version": "0.1",
        "requested_attributes": {
            "attr1_referent": {
                "name": "name",
                "restrictions": {"cred_def_id": CRED_DEF_ID}
            }
        },
        "requested_predicates": {
            "predicate1_referent": {"name": "age", "p_type": ">=", "p_value": p_value}
        }
    }))
}

fn present_simple(
    pres_req: &PresentationRequest,
    credential: &Credential,
    link_secret: &LinkSecret,
    issuer: &Issuer,
) -> anoncreds::Result<Presentation> {
    let mut present = PresentCredentials::new();
    {
        let mut cred = present.add_credential(credential, None, None);
        cred.add_requested_attribute("attr1_referent", true);
        cred.add_requested_predicate("predicate1_referent");
    }
    prover::create_presentation(
        pres_req,
        present,
        None,
        link_secret,
        &issuer.schemas(),
        &issuer.cred_defs(),
    )
}

#[test]
fn presentation_without_revocation() {
    let issuer = Issuer::new(&["name", "age", "sex", "height"], None);
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    let credential = issuer.issue(&link_secret, &gvt_values(), None);
    assert_eq!(
        credential.get_attribute("cred_def_id").unwrap().as_deref(),
        Some(CRED_DEF_ID)
    );

    let pres_req = predicate_request(18);
    let presentation =
        present_simple(&pres_req, &credential, &link_secret, &issuer).expect(ERR_CREATE_PRES);

    let json = presentation.to_json().expect("Error serializing presentation");
    let presentation = Presentation::from_json(&json).expect("Error parsing presentation");
    assert_eq!(
        presentation.requested_proof.revealed_attrs["attr1_referent"].raw,
        "Alex"
    );
    verifier::verify_presentation(
        &presentation,
        &pres_req,
        &issuer.schemas(),
        &issuer.cred_defs(),
        None,
        None,
        None,
    )
    .expect("Error verifying presentation");

    // verifying with another request nonce fails
    let mut other_req = pres_req.clone();
    other_req.nonce = "99".parse().unwrap();
    let err = verifier::verify_presentation(
        &presentation,
        &other_req,
        &issuer.schemas(),
        &issuer.cred_defs(),
        None,
        None,
        None,
    )
    .expect_err("Expected verification failure");
    assert_eq!(err.kind(), ErrorKind::VerificationFailed);

    // the verifier must supply the credential definition
    assert!(verifier::verify_presentation(
        &presentation,
        &pres_req,
        &issuer.schemas(),
        &BTreeMap::new(),
        None,
        None,
        None,
    )
    .is_err());
}

#[test]
fn tampered_reveal_fails() {
    let issuer = Issuer::new(&["name", "age", "sex", "height"], None);
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    let credential = issuer.issue(&link_secret, &gvt_values(), None);
    let pres_req = predicate_request(18);
    let presentation =
        present_simple(&pres_req, &credential, &link_secret, &issuer).expect(ERR_CREATE_PRES);

    let mut raw_changed = presentation.clone();
    raw_changed
        .requested_proof
        .revealed_attrs
        .get_mut("attr1_referent")
        .unwrap()
        .raw = "Mallory".to_string();
    let mut both_changed = raw_changed.clone();
    both_changed
        .requested_proof
        .revealed_attrs
        .get_mut("attr1_referent")
        .unwrap()
        .encoded = encode_credential_attributes(&["Mallory".to_string()]).unwrap()[0].clone();

    for tampered in [raw_changed, both_changed] {
        let err = verifier::verify_presentation(
            &tampered,
            &pres_req,
            &issuer.schemas(),
            &issuer.cred_defs(),
            None,
            None,
            None,
        )
        .expect_err("Expected verification failure");
        assert_eq!(err.kind(), ErrorKind::VerificationFailed);
    }
}

#[test]
fn predicate_not_satisfied() {
    let issuer = Issuer::new(&["name", "age", "sex", "height"], None);
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    let credential = issuer.issue(&link_secret, &gvt_values(), None);

    let err = present_simple(&predicate_request(30), &credential, &link_secret, &issuer)
        .expect_err("Expected predicate failure");
    assert_eq!(err.kind(), ErrorKind::Input);

    // a proof for age >= 18 does not satisfy a request for age >= 30
    let presentation = present_simple(&predicate_request(18), &credential, &link_secret, &issuer)
        .expect(ERR_CREATE_PRES);
    assert!(verifier::verify_presentation(
        &presentation,
        &predicate_request(30),
        &issuer.schemas(),
        &issuer.cred_defs(),
        None,
        None,
        None,
    )
    .is_err());
}

#[test]
fn wrong_link_secret_rejected() {
    let issuer = Issuer::new(&["name", "age"], None);
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    let other_secret = prover::create_link_secret().expect("Error creating link secret");
    let offer = issuer::create_credential_offer(
        SCHEMA_ID.into(),
        CRED_DEF_ID.into(),
        &issuer.cred_def,
        &issuer.key_proof,
    )
    .expect("Error creating credential offer");
    let (request, metadata) = prover::create_credential_request(
        None,
        Some("did:sov:prover"),
        &issuer.cred_def,
        &link_secret,
        "default",
        &offer,
    )
    .expect("Error creating credential request");
    let mut values = MakeCredentialValues::default();
    values.add_raw("name", "Alex").unwrap();
    values.add_raw("age", "28").unwrap();
    let mut credential = issuer::create_credential(
        &issuer.cred_def,
        &issuer.cred_def_private,
        &offer,
        &request,
        values.into(),
        None,
    )
    .expect(ERR_CREATE_CRED);

    let err = prover::process_credential(
        &mut credential,
        &metadata,
        &other_secret,
        &issuer.cred_def,
        None,
    )
    .expect_err("Expected signature failure");
    assert_eq!(err.kind(), ErrorKind::SignatureInvalid);
}

#[test]
fn credential_request_inputs() {
    let issuer = Issuer::new(&["name"], None);
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    let mut offer = issuer::create_credential_offer(
        SCHEMA_ID.into(),
        CRED_DEF_ID.into(),
        &issuer.cred_def,
        &issuer.key_proof,
    )
    .expect("Error creating credential offer");
    let err = prover::create_credential_request(
        Some("entropy"),
        Some("did"),
        &issuer.cred_def,
        &link_secret,
        "default",
        &offer,
    )
    .expect_err("Expected input error");
    assert_eq!(err.kind(), ErrorKind::Input);

    offer.nonce = None;
    let err = prover::create_credential_request(
        Some("entropy"),
        None,
        &issuer.cred_def,
        &link_secret,
        "default",
        &offer,
    )
    .expect_err("Expected malformed offer");
    assert_eq!(err.kind(), ErrorKind::MalformedOffer);
}

#[test]
fn unresolved_referent() {
    let issuer = Issuer::new(&["name", "age", "sex", "height"], None);
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    let credential = issuer.issue(&link_secret, &gvt_values(), None);
    let pres_req = predicate_request(18);

    let mut present = PresentCredentials::new();
    present
        .add_credential(&credential, None, None)
        .add_requested_attribute("attr1_referent", true);
    let err = prover::create_presentation(
        &pres_req,
        present,
        None,
        &link_secret,
        &issuer.schemas(),
        &issuer.cred_defs(),
    )
    .expect_err("Expected unresolved referent");
    assert_eq!(err.kind(), ErrorKind::UnresolvedReferent);

    // a restricted referent cannot be self-attested
    let mut present = PresentCredentials::new();
    present
        .add_credential(&credential, None, None)
        .add_requested_predicate("predicate1_referent");
    let self_attested = BTreeMap::from([("attr1_referent".to_string(), "Alex".to_string())]);
    let err = prover::create_presentation(
        &pres_req,
        present,
        Some(self_attested),
        &link_secret,
        &issuer.schemas(),
        &issuer.cred_defs(),
    )
    .expect_err("Expected input error");
    assert_eq!(err.kind(), ErrorKind::Input);
}

fn revocation_request(from: Option<u64>, to: Option<u64>) -> PresentationRequest {
    request(serde_json::json!({
        "nonce": "98765432101",
        "name": "pres_req_rev",
        "version": "0.1",
        "requested_attributes": {
            "attr1_referent": {"name": "name"}
        },
        "requested_predicates": {},
        "non_revoked": {"from": from, "to": to}
    }))
}

fn present_revocable(
    pres_req: &PresentationRequest,
    credential: &Credential,
    rev_state: &CredentialRevocationState,
    timestamp: Option<u64>,
    link_secret: &LinkSecret,
    issuer: &Issuer,
) -> Presentation {
    let mut present = PresentCredentials::new();
    present
        .add_credential(credential, timestamp, Some(rev_state))
        .add_requested_attribute("attr1_referent", true);
    prover::create_presentation(
        pres_req,
        present,
        None,
        link_secret,
        &issuer.schemas(),
        &issuer.cred_defs(),
    )
    .expect(ERR_CREATE_PRES)
}

fn verify_revocable(
    presentation: &Presentation,
    pres_req: &PresentationRequest,
    issuer: &Issuer,
    status_lists: &[RevocationStatusList],
    overrides: Option<&[NonRevokedIntervalOverride]>,
) -> anoncreds::Result<()> {
    verifier::verify_presentation(
        presentation,
        pres_req,
        &issuer.schemas(),
        &issuer.cred_defs(),
        Some(&issuer.rev_reg_defs()),
        Some(status_lists),
        overrides,
    )
}

#[test]
fn revocation_lifecycle() {
    const T1: u64 = 10;
    const T2: u64 = 20;
    let issuer = Issuer::new(&["name", "age", "sex", "height"], Some(10));
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    let list_t1 = issuer.status_list(T1);
    let credential = issuer.issue(&link_secret, &gvt_values(), Some((&list_t1, 9)));
    assert_eq!(credential.rev_reg_index, Some(9));

    let tails_path = issuer.rev_reg_def().value.tails_location.clone();
    let state_t1 = prover::create_or_update_revocation_state(
        &tails_path,
        issuer.rev_reg_def(),
        &list_t1,
        9,
        None,
        None,
    )
    .expect(ERR_REV_STATE);
    assert_eq!(state_t1.timestamp, T1);

    let list_t2 = issuer.revoke(&list_t1, &[9], T2);
    let lists = [list_t1.clone(), list_t2.clone()];

    // a proof at T1 verifies
    let pres_req = revocation_request(None, Some(100));
    let presentation =
        present_revocable(&pres_req, &credential, &state_t1, None, &link_secret, &issuer);
    assert_eq!(presentation.identifiers[0].timestamp, Some(T1));
    verify_revocable(&presentation, &pres_req, &issuer, &lists, None)
        .expect("Error verifying presentation");

    // no witness can be computed for the revoked index at T2
    let err = prover::create_or_update_revocation_state(
        &tails_path,
        issuer.rev_reg_def(),
        &list_t2,
        9,
        Some(&state_t1),
        Some(&list_t1),
    )
    .expect_err("Expected revoked index");
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // a stale witness claimed against T2 fails
    let presentation = present_revocable(
        &pres_req,
        &credential,
        &state_t1,
        Some(T2),
        &link_secret,
        &issuer,
    );
    assert!(verify_revocable(&presentation, &pres_req, &issuer, &lists, None).is_err());

    // an interval excluding both timestamps fails
    let pres_req = revocation_request(Some(30), Some(40));
    let presentation =
        present_revocable(&pres_req, &credential, &state_t1, None, &link_secret, &issuer);
    let err = verify_revocable(&presentation, &pres_req, &issuer, &lists, None)
        .expect_err("Expected interval failure");
    assert_eq!(err.kind(), ErrorKind::VerificationFailed);

    // the status list for the claimed timestamp must be supplied
    let pres_req = revocation_request(None, Some(100));
    let presentation =
        present_revocable(&pres_req, &credential, &state_t1, None, &link_secret, &issuer);
    assert!(verify_revocable(&presentation, &pres_req, &issuer, &lists[1..], None).is_err());
}

#[test]
fn revocation_state_updates() {
    let issuer = Issuer::new(&["name"], Some(5));
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    let list_1 = issuer.status_list(100);
    let credential = issuer.issue(&link_secret, &[("name", "Alex")], Some((&list_1, 2)));
    let tails_path = issuer.rev_reg_def().value.tails_location.clone();
    let state_1 = prover::create_or_update_revocation_state(
        &tails_path,
        issuer.rev_reg_def(),
        &list_1,
        2,
        None,
        None,
    )
    .expect(ERR_REV_STATE);

    // another credential is revoked, the witness is updated without the tails file
    let list_2 = issuer.revoke(&list_1, &[4], 200);
    let state_2 = prover::create_or_update_revocation_state(
        "missing-tails-file",
        issuer.rev_reg_def(),
        &list_2,
        2,
        Some(&state_1),
        Some(&list_1),
    )
    .expect(ERR_REV_STATE);
    assert_eq!(state_2.timestamp, 200);
    assert_eq!(Some(state_2.rev_reg.accum), list_2.accum);

    // several changes fall back to the tails file
    let list_3 = issuer.revoke(&list_2, &[1, 3], 300);
    let state_3 = prover::create_or_update_revocation_state(
        &tails_path,
        issuer.rev_reg_def(),
        &list_3,
        2,
        Some(&state_2),
        Some(&list_2),
    )
    .expect(ERR_REV_STATE);

    let pres_req = revocation_request(Some(250), None);
    let presentation =
        present_revocable(&pres_req, &credential, &state_3, None, &link_secret, &issuer);
    verify_revocable(&presentation, &pres_req, &issuer, &[list_3], None)
        .expect("Error verifying presentation");

    let err = prover::create_or_update_revocation_state(
        &tails_path,
        issuer.rev_reg_def(),
        &list_1,
        6,
        None,
        None,
    )
    .expect_err("Expected index out of range");
    assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
}

#[test]
fn status_list_timestamps() {
    let issuer = Issuer::new(&["name"], Some(5));
    let list = issuer.status_list(50);
    let (rev_reg_def, rev_reg_def_private) = issuer.revocation.as_ref().unwrap();
    let err = issuer::update_revocation_status_list(
        rev_reg_def,
        rev_reg_def_private,
        &list,
        None,
        Some(BTreeSet::from([1])),
        Some(50),
    )
    .expect_err("Expected non-monotonic timestamp");
    assert_eq!(err.kind(), ErrorKind::NonMonotonicTimestamp);

    let err = issuer::update_revocation_status_list_timestamp_only(40, &list)
        .expect_err("Expected non-monotonic timestamp");
    assert_eq!(err.kind(), ErrorKind::NonMonotonicTimestamp);

    // an unstamped update still cannot be stamped before its predecessor
    let untimed = issuer::update_revocation_status_list(
        rev_reg_def,
        rev_reg_def_private,
        &list,
        None,
        Some(BTreeSet::from([1])),
        None,
    )
    .expect(ERR_STATUS_LIST);
    assert_eq!(untimed.timestamp, None);
    assert_eq!(untimed.latest_timestamp(), Some(50));
    let err = issuer::update_revocation_status_list_timestamp_only(5, &untimed)
        .expect_err("Expected non-monotonic timestamp");
    assert_eq!(err.kind(), ErrorKind::NonMonotonicTimestamp);

    // the floor survives a chain of unstamped updates and serialization
    let untimed = issuer::update_revocation_status_list(
        rev_reg_def,
        rev_reg_def_private,
        &untimed,
        None,
        Some(BTreeSet::from([2])),
        None,
    )
    .expect(ERR_STATUS_LIST);
    let untimed: RevocationStatusList =
        serde_json::from_str(&serde_json::to_string(&untimed).unwrap()).unwrap();
    let err = issuer::update_revocation_status_list(
        rev_reg_def,
        rev_reg_def_private,
        &untimed,
        None,
        Some(BTreeSet::from([3])),
        Some(50),
    )
    .expect_err("Expected non-monotonic timestamp");
    assert_eq!(err.kind(), ErrorKind::NonMonotonicTimestamp);

    let stamped = issuer::update_revocation_status_list_timestamp_only(60, &untimed)
        .expect(ERR_STATUS_LIST);
    assert_eq!(stamped.timestamp, Some(60));
    assert_eq!(stamped.prev_timestamp, None);
    assert_eq!(stamped.revoked_indices().collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn end_to_end_with_interval_override() {
    let issuer = Issuer::new(&["name", "age", "sex", "height"], Some(10));
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    let status_list = issuer.status_list(12);
    let credential = issuer.issue(&link_secret, &gvt_values(), Some((&status_list, 9)));
    let rev_state = prover::create_or_update_revocation_state(
        &issuer.rev_reg_def().value.tails_location,
        issuer.rev_reg_def(),
        &status_list,
        9,
        None,
        None,
    )
    .expect(ERR_REV_STATE);

    let pres_req = request(serde_json::json!({
        "nonce": "182453895158932476",
        "name": "pres_req_1",
        "version": "0.1",
        "requested_attributes": {
            "attr1_referent": {
                "names": ["name", "height"],
                "restrictions": {"attr::name::value": "Alex"}
            },
            "attr2_referent": {"name": "sex"},
            "attr3_referent": {"name": "phone"}
        },
        "requested_predicates": {
            "predicate1_referent": {"name": "age", "p_type": ">=", "p_value": 18}
        },
        "non_revoked": {"from": 13, "to": 200}
    }));

    let mut present = PresentCredentials::new();
    {
        let mut cred = present.add_credential(&credential, None, Some(&rev_state));
        cred.add_requested_attribute("attr1_referent", true);
        cred.add_requested_attribute("attr2_referent", false);
        cred.add_requested_predicate("predicate1_referent");
    }
    let self_attested = BTreeMap::from([("attr3_referent".to_string(), "8-800-300".to_string())]);
    let presentation = prover::create_presentation(
        &pres_req,
        present,
        Some(self_attested),
        &link_secret,
        &issuer.schemas(),
        &issuer.cred_defs(),
    )
    .expect(ERR_CREATE_PRES);

    let requested = &presentation.requested_proof;
    let group = &requested.revealed_attr_groups["attr1_referent"];
    assert_eq!(group.values["name"].raw, "Alex");
    assert_eq!(group.values["height"].raw, "175");
    assert!(requested.unrevealed_attrs.contains_key("attr2_referent"));
    assert_eq!(requested.self_attested_attrs["attr3_referent"], "8-800-300");
    assert_eq!(presentation.identifiers[0].timestamp, Some(12));

    let lists = [status_list];
    let err = verify_revocable(&presentation, &pres_req, &issuer, &lists, None)
        .expect_err("Expected interval failure");
    assert_eq!(err.kind(), ErrorKind::VerificationFailed);

    let overrides = [NonRevokedIntervalOverride::new(REV_REG_ID.into(), 13, 12)];
    verify_revocable(&presentation, &pres_req, &issuer, &lists, Some(&overrides))
        .expect("Error verifying presentation");

    // an override for another start time does not apply
    let overrides = [NonRevokedIntervalOverride::new(REV_REG_ID.into(), 14, 12)];
    assert!(verify_revocable(&presentation, &pres_req, &issuer, &lists, Some(&overrides)).is_err());
}

#[test]
fn attribute_encoding() {
    let raw = ["101 Wilson Lane", "SLC", "87121", "UT", "-1", "2147483648"];
    let encoded =
        encode_credential_attributes(&raw.map(String::from)).expect("Error encoding attributes");
    assert_eq!(
        encoded[0],
        "68086943237164982734333428280784300550565381723532936263016368251445461241953"
    );
    assert_eq!(encoded[2], "87121");
    assert_eq!(encoded[4], "-1");
    assert_ne!(encoded[5], "2147483648");
}

#[test]
fn revocation_bound_to_issuing_registry() {
    const T1: u64 = 10;
    const T2: u64 = 20;
    const OTHER_REG_ID: &str = "mock:uri:revregdef:other";
    let issuer = Issuer::new(&["name", "age", "sex", "height"], Some(10));
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    let list_t1 = issuer.status_list(T1);
    let credential = issuer.issue(&link_secret, &gvt_values(), Some((&list_t1, 9)));
    let state_t1 = prover::create_or_update_revocation_state(
        &issuer.rev_reg_def().value.tails_location,
        issuer.rev_reg_def(),
        &list_t1,
        9,
        None,
        None,
    )
    .expect(ERR_REV_STATE);
    let list_t2 = issuer.revoke(&list_t1, &[9], T2);

    // an untouched registry under the same credential definition
    let mut tails_writer = TailsFileWriter::new(None);
    let (other_def, other_def_private) = issuer::create_revocation_registry_def(
        &issuer.cred_def,
        CRED_DEF_ID.into(),
        ISSUER_ID.into(),
        "other",
        RegistryType::CL_ACCUM,
        10,
        &mut tails_writer,
    )
    .expect("Error creating revocation registry");
    let other_list = issuer::create_revocation_status_list(
        OTHER_REG_ID.into(),
        &other_def,
        &other_def_private,
        true,
        Some(T2),
    )
    .expect("Error creating revocation status list");

    let mut rev_reg_defs = issuer.rev_reg_defs();
    rev_reg_defs.insert(OTHER_REG_ID.into(), other_def.clone());
    let lists = [list_t1.clone(), list_t2, other_list.clone()];
    let pres_req = revocation_request(None, Some(100));
    let verify = |presentation: &Presentation, rev_reg_defs: &RevocationRegistryDefinitions| {
        verifier::verify_presentation(
            presentation,
            &pres_req,
            &issuer.schemas(),
            &issuer.cred_defs(),
            Some(rev_reg_defs),
            Some(&lists),
            None,
        )
    };

    let honest =
        present_revocable(&pres_req, &credential, &state_t1, None, &link_secret, &issuer);
    verify(&honest, &rev_reg_defs).expect("Error verifying presentation");

    // the revoked credential fails against its own registry at T2
    let revoked = present_revocable(
        &pres_req,
        &credential,
        &state_t1,
        Some(T2),
        &link_secret,
        &issuer,
    );
    assert!(verify(&revoked, &rev_reg_defs).is_err());

    // naming the untouched registry instead does not escape revocation
    let mut swapped = revoked.clone();
    swapped.identifiers[0].rev_reg_id = Some(OTHER_REG_ID.into());
    let err = verify(&swapped, &rev_reg_defs).expect_err("Expected registry mismatch");
    assert_eq!(err.kind(), ErrorKind::VerificationFailed);

    // nor does relabelling the credential and proving against that registry
    let mut relabelled = credential.clone();
    relabelled.rev_reg_id = Some(OTHER_REG_ID.into());
    let other_state = prover::create_or_update_revocation_state(
        &other_def.value.tails_location,
        &other_def,
        &other_list,
        9,
        None,
        None,
    )
    .expect(ERR_REV_STATE);
    let mut present = PresentCredentials::new();
    present
        .add_credential(&relabelled, Some(T2), Some(&other_state))
        .add_requested_attribute("attr1_referent", true);
    if let Ok(presentation) = prover::create_presentation(
        &pres_req,
        present,
        None,
        &link_secret,
        &issuer.schemas(),
        &issuer.cred_defs(),
    ) {
        assert!(verify(&presentation, &rev_reg_defs).is_err());
    }

    // the registry definition must belong to the presented credential definition
    let mut foreign_defs = issuer.rev_reg_defs();
    for def in foreign_defs.values_mut() {
        def.cred_def_id = "mock:uri:creddef:other".into();
    }
    assert!(verify(&honest, &foreign_defs).is_err());
}

#[test]
fn revocation_config_cross_checks() {
    let issuer = Issuer::new(&["name"], Some(5));
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    let (reg_def, reg_def_private) = issuer.revocation.as_ref().unwrap();
    let rev_reg_def_id = RevocationRegistryDefinitionId::from(REV_REG_ID);
    let list = issuer.status_list(10);
    let values = [("name", "Alex")];

    // a status list published for another registry
    let other_id = RevocationRegistryDefinitionId::from("mock:uri:revregdef:other");
    let config = CredentialRevocationConfig::new(&other_id, reg_def, reg_def_private, &list, 1);
    let err = issuer
        .try_create_credential(&link_secret, &values, Some(config))
        .expect_err("Expected status list mismatch");
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // a registry defined for another credential definition
    let mut foreign_def = reg_def.clone();
    foreign_def.cred_def_id = "mock:uri:creddef:other".into();
    let config = CredentialRevocationConfig::new(
        &rev_reg_def_id,
        &foreign_def,
        reg_def_private,
        &list,
        1,
    );
    let err = issuer
        .try_create_credential(&link_secret, &values, Some(config))
        .expect_err("Expected registry mismatch");
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // a status list from another issuer
    let mut foreign_list = list.clone();
    foreign_list.issuer_id = "mock:issuer:other".into();
    let config = CredentialRevocationConfig::new(
        &rev_reg_def_id,
        reg_def,
        reg_def_private,
        &foreign_list,
        1,
    );
    let err = issuer
        .try_create_credential(&link_secret, &values, Some(config))
        .expect_err("Expected issuer mismatch");
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let config = CredentialRevocationConfig::new(
        &rev_reg_def_id,
        reg_def,
        reg_def_private,
        &list,
        1,
    );
    let (credential, _) = issuer
        .try_create_credential(&link_secret, &values, Some(config))
        .expect(ERR_CREATE_CRED);
    assert_eq!(credential.rev_reg_id, Some(rev_reg_def_id));
}

#[test]
fn credential_issuance_errors() {
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    let plain = Issuer::new(&["name", "age"], None);

    let cases: [&[(&str, &str)]; 3] = [
        &[("name", "Alex")],
        &[("name", "Alex"), ("age", "28"), ("height", "175")],
        &[("name", "Alex"), ("height", "175")],
    ];
    for values in cases {
        let err = plain
            .try_create_credential(&link_secret, values, None)
            .expect_err("Expected unknown attribute");
        assert_eq!(err.kind(), ErrorKind::UnknownAttribute);
    }

    let revocable = Issuer::new(&["name", "age"], Some(5));
    let values = [("name", "Alex"), ("age", "28")];
    let err = revocable
        .try_create_credential(&link_secret, &values, None)
        .expect_err("Expected revocation config");
    assert_eq!(err.kind(), ErrorKind::RevocationConfigRequired);

    let (reg_def, reg_def_private) = revocable.revocation.as_ref().unwrap();
    let rev_reg_def_id = RevocationRegistryDefinitionId::from(REV_REG_ID);
    let list = revocable.status_list(10);
    let config = CredentialRevocationConfig::new(
        &rev_reg_def_id,
        reg_def,
        reg_def_private,
        &list,
        6,
    );
    let err = revocable
        .try_create_credential(&link_secret, &values, Some(config))
        .expect_err("Expected registry full");
    assert_eq!(err.kind(), ErrorKind::RegistryFull);

    let config = CredentialRevocationConfig::new(
        &rev_reg_def_id,
        reg_def,
        reg_def_private,
        &list,
        1,
    );
    let err = plain
        .try_create_credential(&link_secret, &[("name", "Alex"), ("age", "28")], Some(config))
        .expect_err("Expected revocation not supported");
    assert_eq!(err.kind(), ErrorKind::RevocationNotSupported);

    // a witness against a later accumulator is rejected by the holder
    let config = CredentialRevocationConfig::new(
        &rev_reg_def_id,
        reg_def,
        reg_def_private,
        &list,
        1,
    );
    let (mut credential, metadata) = revocable
        .try_create_credential(&link_secret, &values, Some(config))
        .expect(ERR_CREATE_CRED);
    let later = revocable.revoke(&list, &[3], 20);
    credential.rev_reg = later.accum.map(|accum| RevocationRegistry { accum });
    let err = prover::process_credential(
        &mut credential,
        &metadata,
        &link_secret,
        &revocable.cred_def,
        Some(reg_def),
    )
    .expect_err("Expected invalid witness");
    assert_eq!(err.kind(), ErrorKind::WitnessInvalid);

    let err = issuer::create_schema("gvt", "1.0", ISSUER_ID.into(), Vec::<String>::new().into())
        .expect_err("Expected invalid schema");
    assert_eq!(err.kind(), ErrorKind::InvalidSchema);
}

fn assert_json_stable<T: JsonObject + PartialEq + std::fmt::Debug>(value: &T) {
    let json = value.to_json().expect("Error serializing");
    let parsed = T::from_json(&json).expect("Error parsing");
    assert_eq!(&parsed, value);
    assert_eq!(parsed.to_json().expect("Error serializing"), json);
}

#[test]
fn entities_json_round_trip() {
    let issuer = Issuer::new(&["name", "age", "sex", "height"], Some(10));
    let link_secret = prover::create_link_secret().expect("Error creating link secret");
    assert_json_stable(&issuer.cred_def);
    assert_json_stable(&issuer.cred_def_private);
    assert_json_stable(&issuer.key_proof);
    let (reg_def, reg_def_private) = issuer.revocation.as_ref().unwrap();
    assert_json_stable(reg_def);
    assert_json_stable(reg_def_private);

    let offer = issuer::create_credential_offer(
        SCHEMA_ID.into(),
        CRED_DEF_ID.into(),
        &issuer.cred_def,
        &issuer.key_proof,
    )
    .expect("Error creating credential offer");
    assert_json_stable(&offer);
    let (request, metadata) = prover::create_credential_request(
        Some("entropy"),
        None,
        &issuer.cred_def,
        &link_secret,
        "default",
        &offer,
    )
    .expect("Error creating credential request");
    assert_json_stable(&request);
    assert_json_stable(&metadata);

    let list = issuer.status_list(10);
    let credential = issuer.issue(&link_secret, &gvt_values(), Some((&list, 3)));
    assert_json_stable(&credential);
    let state = prover::create_or_update_revocation_state(
        &reg_def.value.tails_location,
        reg_def,
        &list,
        3,
        None,
        None,
    )
    .expect(ERR_REV_STATE);
    assert_json_stable(&state);

    let pres_req = revocation_request(None, Some(100));
    let presentation =
        present_revocable(&pres_req, &credential, &state, None, &link_secret, &issuer);
    assert_json_stable(&presentation);
    let parsed = Presentation::from_json(presentation.to_json().unwrap()).unwrap();
    verify_revocable(&parsed, &pres_req, &issuer, &[list], None)
        .expect("Error verifying presentation");
}
