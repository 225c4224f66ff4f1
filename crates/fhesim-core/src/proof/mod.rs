//! Input-proof binding and verification.
//!
//! A fresh ciphertext enters the host through an input proof: a credential
//! binding the ciphertext handle to the consuming contract and the
//! submitting principal. In production this is a zero-knowledge proof of
//! plaintext knowledge checked by the coprocessor; the simulation stands it
//! in with a keyed BLAKE3 MAC over the same bindings. What the model
//! preserves is the contract: a proof is valid only for the exact handle it
//! was issued with, only at the intended contract, and only when submitted
//! by the intended principal. Any mismatch, truncation, or tampering is
//! terminal [`ProofError::InvalidProof`].

use std::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::handle::{Handle, Principal};

#[cfg(test)]
mod tests;

/// Size of a serialized input proof in bytes.
pub const PROOF_SIZE: usize = 32;

/// Domain separator for input-proof MACs.
const PROOF_DOMAIN: &[u8] = b"fhesim.input-proof.v1";

/// Errors raised by proof verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// The proof bytes have the wrong length.
    #[error("malformed input proof: expected {PROOF_SIZE} bytes, got {len}")]
    Malformed {
        /// The length of the submitted proof.
        len: usize,
    },

    /// The proof does not bind this (handle, contract, submitter) triple.
    #[error("invalid input proof for handle {handle}")]
    InvalidProof {
        /// The handle the proof was checked against.
        handle: Handle,
    },
}

/// Credential binding a ciphertext handle to its consuming contract and
/// submitting principal.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProof(Vec<u8>);

impl InputProof {
    /// Wraps raw proof bytes received from a caller.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the raw proof bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for InputProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Proof bytes are opaque; avoid dumping them in logs.
        write!(f, "InputProof({} bytes)", self.0.len())
    }
}

/// Verifier for input proofs, keyed per host instance.
///
/// The key never leaves the host. [`InputVerifier::prove`] exists so the
/// in-process encryption client (the input builder) can issue proofs the
/// way the off-chain client would.
pub struct InputVerifier {
    key: [u8; 32],
    chain_id: u64,
}

impl InputVerifier {
    /// Creates a verifier with an explicit key. The chain id is mixed into
    /// every MAC so proofs do not transfer across host instances with
    /// different chain ids.
    #[must_use]
    pub fn new(key: [u8; 32], chain_id: u64) -> Self {
        Self { key, chain_id }
    }

    /// Creates a verifier with a random key.
    #[must_use]
    pub fn generate(chain_id: u64) -> Self {
        Self::new(rand::random(), chain_id)
    }

    fn mac(&self, handle: Handle, contract: Principal, submitter: Principal) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        hasher.update(PROOF_DOMAIN);
        hasher.update(&self.chain_id.to_le_bytes());
        hasher.update(handle.as_bytes());
        hasher.update(contract.as_bytes());
        hasher.update(submitter.as_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Issues a proof binding `handle` to (contract, submitter).
    #[must_use]
    pub fn prove(&self, handle: Handle, contract: Principal, submitter: Principal) -> InputProof {
        InputProof(self.mac(handle, contract, submitter).to_vec())
    }

    /// Verifies that `proof` binds `handle` to (contract, submitter).
    ///
    /// Comparison is constant-time.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` for wrong-length proof bytes and `InvalidProof`
    /// when the binding does not match — a proof issued for a different
    /// handle, a different contract, or a different submitter all fail
    /// identically.
    pub fn verify(
        &self,
        handle: Handle,
        proof: &InputProof,
        contract: Principal,
        submitter: Principal,
    ) -> Result<(), ProofError> {
        let bytes: &[u8; PROOF_SIZE] = proof
            .0
            .as_slice()
            .try_into()
            .map_err(|_| ProofError::Malformed { len: proof.0.len() })?;
        let expected = self.mac(handle, contract, submitter);
        if bool::from(bytes.ct_eq(&expected)) {
            Ok(())
        } else {
            Err(ProofError::InvalidProof { handle })
        }
    }
}

impl fmt::Debug for InputVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the key.
        f.debug_struct("InputVerifier")
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}
