//! Tests for input-proof binding: a proof is valid only for the exact
//! (handle, contract, submitter) triple it was issued with.

use proptest::prelude::*;

use super::*;
use crate::handle::CiphertextKind;

fn test_handle(byte: u8) -> Handle {
    Handle::from_digest([byte; 32], CiphertextKind::Uint32)
}

fn verifier() -> InputVerifier {
    InputVerifier::new([0x5A; 32], 31337)
}

#[test]
fn proof_round_trips_for_the_bound_triple() {
    let v = verifier();
    let handle = test_handle(0x01);
    let contract = Principal::from_label("consumer");
    let submitter = Principal::from_label("alice");
    let proof = v.prove(handle, contract, submitter);
    v.verify(handle, &proof, contract, submitter).expect("valid proof");
}

#[test]
fn proof_for_different_handle_is_rejected() {
    let v = verifier();
    let contract = Principal::from_label("consumer");
    let submitter = Principal::from_label("alice");
    let proof = v.prove(test_handle(0x01), contract, submitter);
    let other = test_handle(0x02);
    let err = v
        .verify(other, &proof, contract, submitter)
        .expect_err("reused across handles");
    assert_eq!(err, ProofError::InvalidProof { handle: other });
}

#[test]
fn proof_for_different_contract_is_rejected() {
    let v = verifier();
    let handle = test_handle(0x03);
    let submitter = Principal::from_label("alice");
    let proof = v.prove(handle, Principal::from_label("intended"), submitter);
    let err = v
        .verify(handle, &proof, Principal::from_label("other"), submitter)
        .expect_err("wrong contract");
    assert_eq!(err, ProofError::InvalidProof { handle });
}

#[test]
fn proof_for_different_submitter_is_rejected() {
    let v = verifier();
    let handle = test_handle(0x04);
    let contract = Principal::from_label("consumer");
    let proof = v.prove(handle, contract, Principal::from_label("alice"));
    let err = v
        .verify(handle, &proof, contract, Principal::from_label("mallory"))
        .expect_err("wrong submitter");
    assert_eq!(err, ProofError::InvalidProof { handle });
}

#[test]
fn truncated_proof_is_malformed() {
    let v = verifier();
    let handle = test_handle(0x05);
    let contract = Principal::from_label("consumer");
    let submitter = Principal::from_label("alice");
    let mut bytes = v.prove(handle, contract, submitter).as_bytes().to_vec();
    bytes.truncate(16);
    let err = v
        .verify(handle, &InputProof::from_bytes(bytes), contract, submitter)
        .expect_err("truncated");
    assert_eq!(err, ProofError::Malformed { len: 16 });
}

#[test]
fn chain_id_is_part_of_the_binding() {
    let handle = test_handle(0x06);
    let contract = Principal::from_label("consumer");
    let submitter = Principal::from_label("alice");
    let mainnet = InputVerifier::new([0x5A; 32], 1);
    let testnet = InputVerifier::new([0x5A; 32], 31337);
    let proof = mainnet.prove(handle, contract, submitter);
    assert!(testnet.verify(handle, &proof, contract, submitter).is_err());
}

proptest! {
    /// Flipping any single proof byte invalidates the proof.
    #[test]
    fn tampered_proofs_are_rejected(pos in 0usize..PROOF_SIZE, flip in 1u8..=255) {
        let v = verifier();
        let handle = test_handle(0x10);
        let contract = Principal::from_label("consumer");
        let submitter = Principal::from_label("alice");
        let mut bytes = v.prove(handle, contract, submitter).as_bytes().to_vec();
        bytes[pos] ^= flip;
        let tampered = InputProof::from_bytes(bytes);
        prop_assert_eq!(
            v.verify(handle, &tampered, contract, submitter),
            Err(ProofError::InvalidProof { handle })
        );
    }

    /// A proof never validates for a handle other than the one it binds.
    #[test]
    fn proofs_never_transfer_between_handles(a in any::<u8>(), b in any::<u8>()) {
        prop_assume!(a != b);
        let v = verifier();
        let contract = Principal::from_label("consumer");
        let submitter = Principal::from_label("alice");
        let proof = v.prove(test_handle(a), contract, submitter);
        prop_assert!(v.verify(test_handle(b), &proof, contract, submitter).is_err());
    }
}
