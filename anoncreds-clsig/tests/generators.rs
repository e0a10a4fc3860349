use anoncreds_clsig::{pedersen_base, DynGenerators, Generators, KeyPair};
use bls12_381::G1Projective;
use hex_literal::hex;

#[test]
fn dyn_generators_expected() {
    let keypair = KeyPair::from_secret_bytes(&hex!(
        "0011223344556677889900112233445566778899001122334455667788990011"
    ))
    .unwrap();
    let message_count = 10;
    let gens_count = message_count + 1;
    let gens = DynGenerators::new(keypair.public_key(), message_count);
    let iter = gens.iter();
    assert_eq!(iter.size_hint(), (gens_count, Some(gens_count)));
    let hm: Vec<G1Projective> = iter.collect();
    assert_eq!(hm.len(), gens_count);
    assert_eq!(gens.to_vec().generator(3), hm[3]);
    assert!(!hm.contains(&pedersen_base()));

    let other = DynGenerators::new(keypair.public_key(), message_count + 1);
    assert_ne!(other.generator(1), hm[1]);
}
