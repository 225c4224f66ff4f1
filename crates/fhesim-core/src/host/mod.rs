//! The coprocessor host: the single entry surface contracts call into.
//!
//! [`FheHost`] owns the handle registry, the ACL, and the input-proof
//! verifier, and enforces the handle lifecycle across them:
//!
//! 1. A value enters through [`FheHost::create_encrypted_input`] (the
//!    in-process stand-in for the off-chain encryption client), which mints
//!    a pending handle and a proof bound to (handle, contract, submitter).
//! 2. The consuming contract admits it with [`FheHost::from_external`];
//!    until then the handle is unknown to every other entry point.
//! 3. Operating on handles requires compute grants on all operands and
//!    derives a fresh handle that starts with no grants.
//! 4. [`FheHost::decrypt`] releases a plaintext only through the
//!    permission gate.
//!
//! Each entry point executes as one atomic transaction: on error, no state
//! changes.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::acl::{AccessControl, Action};
use crate::config::HostConfig;
use crate::error::HostError;
use crate::eval::{self, BinaryOp, CmpOp, EvalError, Operand, UnaryOp};
use crate::handle::{CiphertextKind, Handle, Principal};
use crate::proof::{InputProof, InputVerifier};
use crate::registry::{CiphertextRecord, HandleRegistry};


/// Domain separator for input handle digests.
const INPUT_HANDLE_DOMAIN: &[u8] = b"fhesim.handle.input.v1";

/// Domain separator for derived handle digests.
const DERIVED_HANDLE_DOMAIN: &[u8] = b"fhesim.handle.derived.v1";

/// Domain separator for trivially encrypted handle digests.
const TRIVIAL_HANDLE_DOMAIN: &[u8] = b"fhesim.handle.trivial.v1";

// =============================================================================
// Call context
// =============================================================================

/// The transaction context a host entry point executes under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    contract: Principal,
    caller: Principal,
}

impl CallContext {
    /// Builds a context for `contract` invoked by `caller`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either principal is the zero address.
    pub fn new(contract: Principal, caller: Principal) -> Result<Self, HostError> {
        if contract.is_zero() {
            return Err(HostError::InvalidArgument {
                field: "contract",
                reason: "zero address".to_string(),
            });
        }
        if caller.is_zero() {
            return Err(HostError::InvalidArgument {
                field: "caller",
                reason: "zero address".to_string(),
            });
        }
        Ok(Self { contract, caller })
    }

    /// The contract executing the call.
    #[must_use]
    pub const fn contract(&self) -> Principal {
        self.contract
    }

    /// The principal that invoked the contract.
    #[must_use]
    pub const fn caller(&self) -> Principal {
        self.caller
    }
}

// =============================================================================
// Encrypted inputs
// =============================================================================

/// One externally encrypted value: the handle plus the proof that binds it
/// to its consuming contract and submitter.
#[derive(Debug, Clone)]
pub struct EncryptedInput {
    /// The pending ciphertext handle.
    pub handle: Handle,
    /// The input proof to present at admission.
    pub proof: InputProof,
}

/// A ciphertext encrypted off-chain, awaiting admission via
/// [`FheHost::from_external`].
#[derive(Debug, Clone)]
struct PendingInput {
    kind: CiphertextKind,
    value: u128,
}

/// Builder playing the role of the off-chain encryption client.
///
/// Values pushed here are "encrypted" for a specific (contract, submitter)
/// pair; [`EncryptedInputBuilder::encrypt`] mints one pending handle and
/// one bound proof per value.
#[derive(Debug)]
pub struct EncryptedInputBuilder<'a> {
    host: &'a mut FheHost,
    contract: Principal,
    submitter: Principal,
    values: Vec<(u128, CiphertextKind)>,
}

impl EncryptedInputBuilder<'_> {
    /// Adds an encrypted boolean.
    #[must_use]
    pub fn add_bool(mut self, value: bool) -> Self {
        self.values.push((u128::from(value), CiphertextKind::Bool));
        self
    }

    /// Adds an encrypted 8-bit integer.
    #[must_use]
    pub fn add_u8(mut self, value: u8) -> Self {
        self.values.push((u128::from(value), CiphertextKind::Uint8));
        self
    }

    /// Adds an encrypted 16-bit integer.
    #[must_use]
    pub fn add_u16(mut self, value: u16) -> Self {
        self.values.push((u128::from(value), CiphertextKind::Uint16));
        self
    }

    /// Adds an encrypted 32-bit integer.
    #[must_use]
    pub fn add_u32(mut self, value: u32) -> Self {
        self.values.push((u128::from(value), CiphertextKind::Uint32));
        self
    }

    /// Adds an encrypted 64-bit integer.
    #[must_use]
    pub fn add_u64(mut self, value: u64) -> Self {
        self.values.push((u128::from(value), CiphertextKind::Uint64));
        self
    }

    /// Adds an encrypted 128-bit integer.
    #[must_use]
    pub fn add_u128(mut self, value: u128) -> Self {
        self.values.push((value, CiphertextKind::Uint128));
        self
    }

    /// Encrypts the batch: mints pending handles and proofs bound to the
    /// builder's (contract, submitter) pair.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty batch, a zero contract or
    /// submitter address, a batch over `max_inputs_per_batch`, or when the
    /// pending-input capacity would be exceeded.
    pub fn encrypt(self) -> Result<Vec<EncryptedInput>, HostError> {
        if self.contract.is_zero() {
            return Err(HostError::InvalidArgument {
                field: "contract",
                reason: "zero address".to_string(),
            });
        }
        if self.submitter.is_zero() {
            return Err(HostError::InvalidArgument {
                field: "submitter",
                reason: "zero address".to_string(),
            });
        }
        if self.values.is_empty() {
            return Err(HostError::InvalidArgument {
                field: "inputs",
                reason: "empty input batch".to_string(),
            });
        }
        let max_batch = self.host.config.max_inputs_per_batch;
        if self.values.len() > max_batch {
            return Err(HostError::InvalidArgument {
                field: "inputs",
                reason: format!("batch of {} exceeds limit {max_batch}", self.values.len()),
            });
        }
        let max_pending = self.host.config.max_pending_inputs;
        if self.host.pending.len() + self.values.len() > max_pending {
            return Err(HostError::InvalidArgument {
                field: "inputs",
                reason: format!("pending-input capacity {max_pending} exceeded"),
            });
        }

        let mut inputs = Vec::with_capacity(self.values.len());
        for (value, kind) in self.values {
            let handle = self.host.mint_handle(INPUT_HANDLE_DOMAIN, kind, &[]);
            let proof = self
                .host
                .verifier
                .prove(handle, self.contract, self.submitter);
            self.host.pending.insert(handle, PendingInput { kind, value });
            inputs.push(EncryptedInput { handle, proof });
        }
        debug!(count = inputs.len(), contract = %self.contract, "encrypted input batch");
        Ok(inputs)
    }

    /// Encrypts a single-value batch.
    ///
    /// # Errors
    ///
    /// As [`EncryptedInputBuilder::encrypt`], plus `InvalidArgument` when
    /// the batch does not hold exactly one value.
    pub fn encrypt_one(self) -> Result<EncryptedInput, HostError> {
        if self.values.len() != 1 {
            return Err(HostError::InvalidArgument {
                field: "inputs",
                reason: format!("expected exactly one value, got {}", self.values.len()),
            });
        }
        let mut inputs = self.encrypt()?;
        // Length checked above; encrypt preserves it.
        inputs.pop().ok_or(HostError::InvalidArgument {
            field: "inputs",
            reason: "empty input batch".to_string(),
        })
    }
}

// =============================================================================
// Host
// =============================================================================

/// Simulated FHE coprocessor host.
pub struct FheHost {
    config: HostConfig,
    registry: HandleRegistry,
    acl: AccessControl,
    verifier: InputVerifier,
    pending: HashMap<Handle, PendingInput>,
    minting_nonce: [u8; 16],
    handle_counter: u64,
}

impl FheHost {
    /// Creates a host with a freshly generated verifier key.
    #[must_use]
    pub fn new(config: HostConfig) -> Self {
        let verifier = InputVerifier::generate(config.chain_id);
        Self {
            registry: HandleRegistry::new(config.max_handles),
            acl: AccessControl::new(),
            verifier,
            pending: HashMap::new(),
            minting_nonce: rand::random(),
            handle_counter: 0,
            config,
        }
    }

    /// The host configuration.
    #[must_use]
    pub const fn config(&self) -> &HostConfig {
        &self.config
    }

    fn mint_handle(
        &mut self,
        domain: &'static [u8],
        kind: CiphertextKind,
        parts: &[&[u8]],
    ) -> Handle {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain);
        hasher.update(&self.minting_nonce);
        hasher.update(&self.handle_counter.to_le_bytes());
        for part in parts {
            hasher.update(part);
        }
        self.handle_counter += 1;
        Handle::from_digest(*hasher.finalize().as_bytes(), kind)
    }

    // -------------------------------------------------------------------------
    // Input lifecycle
    // -------------------------------------------------------------------------

    /// Starts an encrypted-input batch targeting `contract`, submitted by
    /// `submitter`.
    pub fn create_encrypted_input(
        &mut self,
        contract: Principal,
        submitter: Principal,
    ) -> EncryptedInputBuilder<'_> {
        EncryptedInputBuilder {
            host: self,
            contract,
            submitter,
            values: Vec::new(),
        }
    }

    /// Admits an externally encrypted ciphertext after verifying its proof
    /// against the calling contract and transaction caller.
    ///
    /// Re-admitting an already admitted handle with its valid proof is a
    /// no-op returning the handle. The admitted handle starts with no
    /// grants; the contract must issue them before using it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProof` when the proof does not bind
    /// (handle, ctx.contract, ctx.caller) — including proofs issued for a
    /// different handle, contract, or submitter — and `UnknownHandle` when
    /// no pending ciphertext exists for a verified handle.
    pub fn from_external(
        &mut self,
        handle: Handle,
        proof: &InputProof,
        ctx: &CallContext,
    ) -> Result<Handle, HostError> {
        if let Err(err) = self
            .verifier
            .verify(handle, proof, ctx.contract(), ctx.caller())
        {
            warn!(handle = %handle, contract = %ctx.contract(), "input proof rejected");
            return Err(err.into());
        }
        if self.registry.contains(&handle) {
            return Ok(handle);
        }
        let Some(input) = self.pending.get(&handle).cloned() else {
            return Err(HostError::UnknownHandle { handle });
        };
        self.registry.insert(
            handle,
            CiphertextRecord::new(input.kind, ctx.contract(), input.value),
        )?;
        self.pending.remove(&handle);
        debug!(handle = %handle, contract = %ctx.contract(), "admitted external ciphertext");
        Ok(handle)
    }

    /// Mints a handle for a public plaintext. The calling contract becomes
    /// the holder; the handle starts with no grants.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` when the registry is full.
    pub fn trivial_encrypt(
        &mut self,
        value: u128,
        kind: CiphertextKind,
        ctx: &CallContext,
    ) -> Result<Handle, HostError> {
        let handle = self.mint_handle(TRIVIAL_HANDLE_DOMAIN, kind, &[&value.to_le_bytes()]);
        self.registry
            .insert(handle, CiphertextRecord::new(kind, ctx.contract(), value))?;
        Ok(handle)
    }

    // -------------------------------------------------------------------------
    // Operator surface
    // -------------------------------------------------------------------------

    /// Resolves an encrypted operand through the permission gate.
    fn operand_record(
        &self,
        handle: Handle,
        contract: Principal,
    ) -> Result<(CiphertextKind, u128), HostError> {
        let record = self
            .registry
            .get(&handle)
            .ok_or(HostError::UnknownHandle { handle })?;
        if let Err(err) = self.acl.require(handle, contract, Action::Compute) {
            warn!(handle = %handle, contract = %contract, "compute denied");
            return Err(err.into());
        }
        Ok((record.kind, record.value()))
    }

    fn derive(
        &mut self,
        op_name: &'static str,
        kind: CiphertextKind,
        value: u128,
        ctx: &CallContext,
    ) -> Result<Handle, HostError> {
        let handle = self.mint_handle(DERIVED_HANDLE_DOMAIN, kind, &[op_name.as_bytes()]);
        self.registry
            .insert(handle, CiphertextRecord::new(kind, ctx.contract(), value))?;
        debug!(op = op_name, handle = %handle, "derived handle");
        Ok(handle)
    }

    /// Applies a binary operator, deriving a fresh ungranted handle.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when the calling contract lacks a compute
    /// grant on any encrypted operand, `UnknownHandle` for unregistered
    /// operands, `KindMismatch` when operand kinds disagree,
    /// `EncryptedDivisor` for `div`/`rem` with an encrypted right operand,
    /// and `DivisionByZero` for a zero scalar divisor or modulus.
    pub fn binary(
        &mut self,
        op: BinaryOp,
        lhs: Handle,
        rhs: Operand,
        ctx: &CallContext,
    ) -> Result<Handle, HostError> {
        let (kind, lhs_value) = self.operand_record(lhs, ctx.contract())?;
        let rhs_value = self.resolve_rhs(op.requires_scalar_rhs(), op.name(), kind, rhs, ctx)?;
        let value = eval::apply_binary(op, kind, lhs_value, rhs_value)?;
        self.derive(op.name(), kind, value, ctx)
    }

    /// Applies a comparison operator, deriving a fresh ungranted `Bool`
    /// handle.
    ///
    /// # Errors
    ///
    /// As [`FheHost::binary`], minus the divisor shapes.
    pub fn compare(
        &mut self,
        op: CmpOp,
        lhs: Handle,
        rhs: Operand,
        ctx: &CallContext,
    ) -> Result<Handle, HostError> {
        let (kind, lhs_value) = self.operand_record(lhs, ctx.contract())?;
        let rhs_value = self.resolve_rhs(false, op.name(), kind, rhs, ctx)?;
        let value = eval::apply_cmp(op, kind, lhs_value, rhs_value)?;
        self.derive(op.name(), CiphertextKind::Bool, u128::from(value), ctx)
    }

    /// Applies a unary operator, deriving a fresh ungranted handle.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` without a compute grant on the operand,
    /// `UnknownHandle` for an unregistered operand, and
    /// `UnsupportedForKind` for `neg` on `Bool`.
    pub fn unary(
        &mut self,
        op: UnaryOp,
        operand: Handle,
        ctx: &CallContext,
    ) -> Result<Handle, HostError> {
        let (kind, value) = self.operand_record(operand, ctx.contract())?;
        let result = eval::apply_unary(op, kind, value)?;
        self.derive(op.name(), kind, result, ctx)
    }

    /// Ternary select: derives `if_true` or `if_false` depending on the
    /// encrypted condition, without revealing which branch was taken.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` without compute grants on all three
    /// operands, `KindMismatch` when the condition is not `Bool` or the
    /// arms disagree, and `UnknownHandle` for unregistered operands.
    pub fn select(
        &mut self,
        cond: Handle,
        if_true: Handle,
        if_false: Handle,
        ctx: &CallContext,
    ) -> Result<Handle, HostError> {
        let (cond_kind, cond_value) = self.operand_record(cond, ctx.contract())?;
        if cond_kind != CiphertextKind::Bool {
            return Err(EvalError::KindMismatch {
                expected: CiphertextKind::Bool,
                actual: cond_kind,
            }
            .into());
        }
        let (true_kind, true_value) = self.operand_record(if_true, ctx.contract())?;
        let (false_kind, false_value) = self.operand_record(if_false, ctx.contract())?;
        if true_kind != false_kind {
            return Err(EvalError::KindMismatch {
                expected: true_kind,
                actual: false_kind,
            }
            .into());
        }
        let value = if cond_value != 0 { true_value } else { false_value };
        self.derive("select", true_kind, value, ctx)
    }

    fn resolve_rhs(
        &self,
        scalar_only: bool,
        op_name: &'static str,
        lhs_kind: CiphertextKind,
        rhs: Operand,
        ctx: &CallContext,
    ) -> Result<u128, HostError> {
        match rhs {
            Operand::Scalar(value) => Ok(value),
            Operand::Handle(handle) => {
                if scalar_only {
                    return Err(EvalError::EncryptedDivisor { op: op_name }.into());
                }
                let (kind, value) = self.operand_record(handle, ctx.contract())?;
                if kind != lhs_kind {
                    return Err(EvalError::KindMismatch {
                        expected: lhs_kind,
                        actual: kind,
                    }
                    .into());
                }
                Ok(value)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Grant issuance
    // -------------------------------------------------------------------------

    /// Requires that `contract` may issue grants on `handle`: it must be
    /// the handle's holder or already hold a compute grant.
    fn require_grant_authority(
        &self,
        handle: Handle,
        contract: Principal,
    ) -> Result<(), HostError> {
        let record = self
            .registry
            .get(&handle)
            .ok_or(HostError::UnknownHandle { handle })?;
        if record.holder == contract || self.acl.is_allowed(handle, contract, Action::Compute) {
            Ok(())
        } else {
            warn!(handle = %handle, contract = %contract, "grant issuance denied");
            Err(crate::acl::AclError::PermissionDenied {
                handle,
                principal: contract,
                action: Action::Compute,
            }
            .into())
        }
    }

    /// Contract self-grant: the calling contract may compute on and
    /// decrypt `handle` from now on. Not retroactive and never revoked.
    ///
    /// # Errors
    ///
    /// Returns `UnknownHandle` for an unregistered handle and
    /// `PermissionDenied` when the calling contract is neither the holder
    /// nor already granted.
    pub fn allow_self(&mut self, handle: Handle, ctx: &CallContext) -> Result<(), HostError> {
        self.require_grant_authority(handle, ctx.contract())?;
        self.acl.allow_contract(handle, ctx.contract());
        Ok(())
    }

    /// User decrypt grant on `handle` for `principal`, issued by the
    /// calling contract.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for the zero address, `UnknownHandle` for
    /// an unregistered handle, and `PermissionDenied` when the calling
    /// contract may not issue grants on the handle.
    pub fn allow(
        &mut self,
        handle: Handle,
        principal: Principal,
        ctx: &CallContext,
    ) -> Result<(), HostError> {
        if principal.is_zero() {
            return Err(HostError::InvalidArgument {
                field: "principal",
                reason: "zero address".to_string(),
            });
        }
        self.require_grant_authority(handle, ctx.contract())?;
        self.acl.allow_user(handle, principal, ctx.contract());
        Ok(())
    }

    /// Revokes a user decrypt grant previously issued by the calling
    /// contract.
    ///
    /// # Errors
    ///
    /// Returns `GrantNotFound` when no user grant exists and `RevokeDenied`
    /// when the calling contract did not issue it.
    pub fn revoke(
        &mut self,
        handle: Handle,
        principal: Principal,
        ctx: &CallContext,
    ) -> Result<(), HostError> {
        self.acl.revoke_user(handle, principal, ctx.contract())?;
        Ok(())
    }

    /// Returns `true` if a grant record permits (handle, principal, action).
    #[must_use]
    pub fn is_allowed(&self, handle: Handle, principal: Principal, action: Action) -> bool {
        self.acl.is_allowed(handle, principal, action)
    }

    /// Returns `true` if any grant exists on the handle. Freshly derived
    /// and freshly admitted handles report `false`.
    #[must_use]
    pub fn has_grants(&self, handle: Handle) -> bool {
        self.acl.has_grants(handle)
    }

    // -------------------------------------------------------------------------
    // Decryption
    // -------------------------------------------------------------------------

    /// Permission-gated plaintext release, standing in for the external
    /// threshold-decryption oracle.
    ///
    /// # Errors
    ///
    /// Returns `UnknownHandle` for an unregistered handle and
    /// `PermissionDenied` when `principal` holds no decrypt grant.
    pub fn decrypt(&self, handle: Handle, principal: Principal) -> Result<u128, HostError> {
        let record = self
            .registry
            .get(&handle)
            .ok_or(HostError::UnknownHandle { handle })?;
        if let Err(err) = self.acl.require(handle, principal, Action::Decrypt) {
            warn!(handle = %handle, principal = %principal, "decrypt denied");
            return Err(err.into());
        }
        Ok(record.value())
    }

    /// Boolean decrypt, restricted to `Bool` handles.
    ///
    /// # Errors
    ///
    /// As [`FheHost::decrypt`], plus `KindMismatch` for a non-`Bool`
    /// handle.
    pub fn decrypt_bool(&self, handle: Handle, principal: Principal) -> Result<bool, HostError> {
        let record = self
            .registry
            .get(&handle)
            .ok_or(HostError::UnknownHandle { handle })?;
        if record.kind != CiphertextKind::Bool {
            return Err(EvalError::KindMismatch {
                expected: CiphertextKind::Bool,
                actual: record.kind,
            }
            .into());
        }
        Ok(self.decrypt(handle, principal)? != 0)
    }
}

impl std::fmt::Debug for FheHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FheHost")
            .field("config", &self.config)
            .field("registered", &self.registry.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
