//! # fhesim-core
//!
//! A simulated FHE coprocessor host implementing the encrypted-handle
//! permission model: handle registry, access-control list, input-proof
//! verification, grant issuance, and a plaintext-backed evaluator for the
//! homomorphic operator set.
//!
//! The cryptography is deliberately absent. Real ciphertext arithmetic,
//! zero-knowledge input proofs, and threshold decryption belong to an
//! external coprocessor; what this crate implements is the *policy* that
//! surrounds them, with enough machinery to enforce it:
//!
//! - **Handles** are opaque 32-byte references. The backing plaintext
//!   never leaves the host except through the permission gate.
//! - **Input proofs** bind a fresh ciphertext to its consuming contract
//!   and submitting principal; any mismatch is terminal.
//! - **Grants** are additive, never retroactive, and never inherited:
//!   every derived handle starts with an empty grant set.
//!
//! ## Example
//!
//! The canonical counter flow — encrypt, admit, self-grant, add, re-grant,
//! decrypt:
//!
//! ```rust
//! use fhesim_core::{
//!     BinaryOp, CallContext, FheHost, HostConfig, Operand, Principal,
//! };
//!
//! # fn main() -> Result<(), fhesim_core::HostError> {
//! let mut host = FheHost::new(HostConfig::default());
//! let contract = Principal::from_label("counter");
//! let alice = Principal::from_label("alice");
//! let ctx = CallContext::new(contract, alice)?;
//!
//! // Off-chain: encrypt the value for (contract, alice).
//! let input = host
//!     .create_encrypted_input(contract, alice)
//!     .add_u64(123_456)
//!     .encrypt_one()?;
//!
//! // On-chain: admit the ciphertext and grant the contract access.
//! let count = host.from_external(input.handle, &input.proof, &ctx)?;
//! host.allow_self(count, &ctx)?;
//!
//! // Derive, then re-grant: the result inherits nothing.
//! let next = host.binary(BinaryOp::Add, count, Operand::Scalar(1), &ctx)?;
//! host.allow_self(next, &ctx)?;
//! host.allow(next, alice, &ctx)?;
//!
//! assert_eq!(host.decrypt(next, alice)?, 123_457);
//! # Ok(())
//! # }
//! ```

pub mod acl;
pub mod config;
mod error;
pub mod eval;
pub mod handle;
pub mod host;
pub mod proof;
pub mod registry;

pub use acl::{AccessControl, AclError, Action};
pub use config::{ConfigError, HostConfig};
pub use error::HostError;
pub use eval::{BinaryOp, CmpOp, EvalError, Operand, UnaryOp};
pub use handle::{
    CiphertextKind, Handle, Principal, HANDLE_SIZE, HANDLE_VERSION, PRINCIPAL_SIZE,
};
pub use host::{CallContext, EncryptedInput, EncryptedInputBuilder, FheHost};
pub use proof::{InputProof, InputVerifier, ProofError, PROOF_SIZE};
pub use registry::{CiphertextRecord, HandleRegistry, RegistryError};
