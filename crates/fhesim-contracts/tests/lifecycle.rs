//! End-to-end lifecycle walkthroughs across contracts sharing one host.

use fhesim_contracts::{Counter, ForgetfulCounter, SharedVault};
use fhesim_core::{FheHost, HostConfig, Principal};

fn alice() -> Principal {
    Principal::from_label("alice")
}

/// The worked reference flow: set 123456, increment, decrypt 123457; the
/// same flow without result grants dead-ends at decrypt.
#[test]
fn counter_walkthrough_with_and_without_grants() {
    let mut host = FheHost::new(HostConfig::default());

    let mut good = Counter::new(Principal::from_label("good-counter"));
    let input = host
        .create_encrypted_input(good.address(), alice())
        .add_u64(123_456)
        .encrypt_one()
        .expect("encrypt");
    good.set(&mut host, alice(), &input).expect("set");
    good.increment(&mut host, alice()).expect("increment");
    assert_eq!(host.decrypt(good.count().expect("set"), alice()), Ok(123_457));

    let mut bad = ForgetfulCounter::new(Principal::from_label("bad-counter"));
    let input = host
        .create_encrypted_input(Principal::from_label("bad-counter"), alice())
        .add_u64(123_456)
        .encrypt_one()
        .expect("encrypt");
    bad.set(&mut host, alice(), &input).expect("set");
    bad.increment(&mut host, alice()).expect("increment");
    assert!(host
        .decrypt(bad.count().expect("set"), alice())
        .expect_err("missing result grant")
        .is_permission_denied());
}

/// Handles are bound to the contract that admitted them: another contract
/// on the same host can neither decrypt nor grant its way in.
#[test]
fn contracts_are_isolated_on_a_shared_host() {
    let mut host = FheHost::new(HostConfig::default());

    let mut vault = SharedVault::new(Principal::from_label("vault"), alice());
    let input = host
        .create_encrypted_input(vault.address(), alice())
        .add_u64(9_000)
        .encrypt_one()
        .expect("encrypt");
    vault.store(&mut host, alice(), &input).expect("store");
    let secret = vault.secret().expect("stored");

    // A counter deployed next door holds no grants on the vault's secret.
    let other_contract = Principal::from_label("counter");
    assert!(host
        .decrypt(secret, other_contract)
        .expect_err("foreign contract")
        .is_permission_denied());

    // And an unrelated caller cannot pull the vault's input into another
    // contract: the proof was spent against the vault's address.
    let mut counter = Counter::new(other_contract);
    let err = counter
        .set(&mut host, alice(), &input)
        .expect_err("proof bound to the vault");
    assert!(err.is_invalid_proof());
}
