//! End-to-end oracle flow: deploy the verifier, request signed claims, and
//! submit them for on-chain verification.

use ark_bn254::Fr;

use age_oracle::chain::{Address, ChainError, LocalChain, Operation, TestAccount};
use age_oracle::contract::ContractError;
use age_oracle::field::FieldElem;
use age_oracle::keys::{PrivateKey, DEV_PRIVATE_KEY};
use age_oracle::oracle::AgeOracle;
use age_oracle::signature::Signature;

fn oracle() -> AgeOracle {
    AgeOracle::new(PrivateKey::from_base58(DEV_PRIVATE_KEY).unwrap())
}

fn local_deploy() -> (LocalChain, TestAccount, Address) {
    let mut chain = LocalChain::new();
    let deployer = chain.test_account(0).unwrap();
    let contract_key = PrivateKey::random();
    let address = chain
        .deploy_age_verifier(&deployer, &contract_key, oracle().public_key())
        .unwrap();
    (chain, deployer, address)
}

#[test]
fn deploys_the_age_verifier_with_the_oracle_key() {
    let (chain, _, address) = local_deploy();
    assert_eq!(
        chain.oracle_public_key(address).unwrap(),
        oracle().public_key()
    );
}

#[test]
fn emits_an_id_event_when_age_is_above_threshold_and_signature_is_valid() {
    let (mut chain, deployer, address) = local_deploy();

    let claim = oracle().signed_age("1").unwrap();
    let event = chain
        .submit_verification(&deployer, address, &claim)
        .unwrap();

    assert_eq!(event.id, claim.data.id);
    assert_eq!(chain.events(address), vec![event]);
}

#[test]
fn rejects_when_age_is_below_threshold_even_with_a_valid_signature() {
    let (mut chain, deployer, address) = local_deploy();

    let claim = oracle().signed_age("2").unwrap();
    assert!(claim
        .signature
        .verify(&claim.public_key, &[claim.data.id.0, claim.data.age.0]));

    let err = chain
        .submit_verification(&deployer, address, &claim)
        .unwrap_err();
    assert!(matches!(
        err,
        ChainError::Contract(ContractError::BelowThreshold(_))
    ));
    assert!(chain.events(address).is_empty());
}

#[test]
fn every_id_but_the_adult_one_falls_below_the_threshold() {
    let (mut chain, deployer, address) = local_deploy();

    for id in ["2", "3", "42", "999999"] {
        let claim = oracle().signed_age(id).unwrap();
        let result = chain.submit_verification(&deployer, address, &claim);
        assert!(result.is_err(), "id {id} unexpectedly verified");
    }
    assert!(chain.events(address).is_empty());
}

#[test]
fn rejects_when_the_signature_covers_a_different_claim() {
    let (mut chain, deployer, address) = local_deploy();

    // Age well above threshold, but the signature covers age 25.
    let key = PrivateKey::from_base58(DEV_PRIVATE_KEY).unwrap();
    let id = Fr::from(1u64);
    let signature = Signature::create(&key, &[id, Fr::from(25u64)]);

    let mut txn = chain.transaction(
        &deployer,
        vec![Operation::Verify {
            contract: address,
            id,
            age: Fr::from(87u64),
            signature,
        }],
    );
    txn.prove();
    let err = txn.send(&mut chain).unwrap_err();

    assert!(matches!(
        err,
        ChainError::Contract(ContractError::InvalidSignature)
    ));
    assert!(chain.events(address).is_empty());
}

#[test]
fn repeated_verifications_append_to_the_event_log() {
    let (mut chain, deployer, address) = local_deploy();
    let claim = oracle().signed_age("1").unwrap();

    chain
        .submit_verification(&deployer, address, &claim)
        .unwrap();
    chain
        .submit_verification(&deployer, address, &claim)
        .unwrap();

    let events = chain.events(address);
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.id == FieldElem::from(1u64)));
}

#[test]
fn claim_survives_a_json_round_trip_before_verification() {
    let (mut chain, deployer, address) = local_deploy();

    // The HTTP caller sees the claim as JSON; verify what they would see.
    let json = serde_json::to_string(&oracle().signed_age("1").unwrap()).unwrap();
    let claim: age_oracle::oracle::SignedClaim = serde_json::from_str(&json).unwrap();

    let event = chain
        .submit_verification(&deployer, address, &claim)
        .unwrap();
    assert_eq!(event.id, FieldElem::from(1u64));
}
