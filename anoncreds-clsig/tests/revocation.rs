use anoncreds_clsig::{
    registry_element, Accumulator, CreateChallenge, DynGenerators, Error, KeyPair, Message,
    NonMembershipWitness, NonRevocationProof, Nonce, PredicateType, ProofChallenge,
    ProverMessages, RangeProof, SignatureMessages, Tails, TailsGenerator, VerifierMessages,
};
use bls12_381::{G1Affine, Scalar};
use rand::rngs::OsRng;

struct TailsVec(std::vec::IntoIter<G1Affine>);

impl Tails for TailsVec {
    type Error = Error;

    fn next_tail(&mut self) -> Result<G1Affine, Error> {
        self.0
            .next()
            .ok_or_else(|| Error::from_msg(anoncreds_clsig::ErrorKind::Usage, "Tails exhausted"))
    }
}

#[test]
fn tails_generator_length() {
    let key = KeyPair::random_with_rng(OsRng);
    let gen = TailsGenerator::new(&key, 5).unwrap();
    assert_eq!(gen.len(), 5);
    let tails: Vec<G1Affine> = gen.collect();
    assert_eq!(tails[0], G1Affine::generator());
    assert!(TailsGenerator::new(&KeyPair::from_public_key(*key.public_key()), 5).is_err());
}

#[test]
fn credential_with_predicate_and_non_revocation() {
    let issuer = KeyPair::random_with_rng(OsRng);
    let registry = KeyPair::random_with_rng(OsRng);
    let reg_id = "registry";
    let index = 9;
    let element = registry_element(reg_id, index);
    let revoked: Vec<Scalar> = [2, 3].iter().map(|i| registry_element(reg_id, *i)).collect();
    let accum = Accumulator::from_revoked(&registry, revoked.iter().copied()).unwrap();

    let tails: Vec<G1Affine> = TailsGenerator::new(&registry, 10).unwrap().collect();
    let witness =
        NonMembershipWitness::from_tails(&element, &revoked, &mut TailsVec(tails.into_iter()))
            .expect("Error computing witness");
    witness
        .verify(&element, &accum, registry.public_key())
        .expect("Error verifying witness");

    // link secret, age, registry element
    let age = 28i64;
    let messages = [
        Message::hash("secret"),
        Message::from(age as u64),
        Message::from(element),
    ];
    let gens = DynGenerators::new(issuer.public_key(), messages.len());
    let mut signer = SignatureMessages::signer(&gens, &issuer);
    signer.append(messages.iter().copied()).unwrap();
    let sig = signer.sign().unwrap();

    let blindings = [
        Nonce::random_with_rng(OsRng),
        Nonce::random_with_rng(OsRng),
        Nonce::random_with_rng(OsRng),
    ];
    let mut prover = ProverMessages::new(&gens);
    for (msg, blinding) in messages.iter().zip(blindings) {
        prover.push_hidden_with(*msg, blinding).unwrap();
    }
    let sig_ctx = prover.prepare_with_rng(&sig, OsRng).unwrap();
    let nonrevoc_ctx =
        NonRevocationProof::prepare_with_rng(&witness, &accum, &element, blindings[2], OsRng)
            .unwrap();
    let range_ctx =
        RangeProof::prepare_with_rng(age, PredicateType::GE, 18, blindings[1], OsRng).unwrap();
    let nonce = Nonce::random_with_rng(OsRng);
    let challenge =
        ProofChallenge::create(&[&sig_ctx, &nonrevoc_ctx, &range_ctx], nonce, None).unwrap();
    let sig_proof = sig_ctx.complete(challenge).unwrap();
    let nonrevoc_proof = nonrevoc_ctx.complete(challenge).unwrap();
    let range_proof = range_ctx.complete(challenge).unwrap();

    let mut verifier = VerifierMessages::new(&gens);
    verifier.push_hidden_count(3).unwrap();
    assert!(sig_proof
        .verify(issuer.public_key(), &verifier, challenge)
        .unwrap());
    let age_resp = sig_proof.hidden_response(&verifier, 1).unwrap();
    let elem_resp = sig_proof.hidden_response(&verifier, 2).unwrap();

    let nonrevoc_v = nonrevoc_proof.verifier(&accum, elem_resp, challenge);
    nonrevoc_v
        .verify(registry.public_key())
        .expect("Error verifying non-revocation proof");
    let range_v = range_proof
        .verifier(PredicateType::GE, 18, age_resp, challenge)
        .unwrap();
    range_v.verify().expect("Error verifying range proof");
    let challenge_v = ProofChallenge::create(
        &[&sig_proof as &dyn CreateChallenge, &nonrevoc_v, &range_v],
        nonce,
        None,
    )
    .unwrap();
    assert_eq!(challenge, challenge_v);

    // revoking the element invalidates the proof against the new accumulator
    let revoked_accum = accum.update(&registry, &[element], &[]).unwrap();
    assert!(nonrevoc_proof
        .verifier(&revoked_accum, elem_resp, challenge)
        .verify(registry.public_key())
        .is_err());
    assert!(witness
        .update_revoked(&element, &element, &accum)
        .is_err());
}
