//! Confidential token with encrypted balances.
//!
//! The classic select-guarded transfer: an insufficient balance moves an
//! encrypted zero instead of failing, so observers cannot distinguish a
//! successful transfer from a declined one. Balances are revealed only to
//! their owners.

use std::collections::HashMap;

use tracing::debug;

use fhesim_core::{
    BinaryOp, CallContext, CiphertextKind, CmpOp, EncryptedInput, FheHost, Handle, HostError,
    Operand, Principal,
};

/// Token contract mapping principals to encrypted `u64` balances.
#[derive(Debug)]
pub struct ConfidentialToken {
    address: Principal,
    balances: HashMap<Principal, Handle>,
}

impl ConfidentialToken {
    /// Deploys the token at `address`, minting `supply` to `owner`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for zero addresses.
    pub fn new(
        host: &mut FheHost,
        address: Principal,
        owner: Principal,
        supply: u64,
    ) -> Result<Self, HostError> {
        let ctx = CallContext::new(address, owner)?;
        let balance = host.trivial_encrypt(supply.into(), CiphertextKind::Uint64, &ctx)?;
        host.allow_self(balance, &ctx)?;
        host.allow(balance, owner, &ctx)?;
        let mut balances = HashMap::new();
        balances.insert(owner, balance);
        Ok(Self { address, balances })
    }

    /// The contract address.
    #[must_use]
    pub const fn address(&self) -> Principal {
        self.address
    }

    /// The encrypted balance handle for `principal`, if any.
    #[must_use]
    pub fn balance_of(&self, principal: Principal) -> Option<Handle> {
        self.balances.get(&principal).copied()
    }

    fn balance_or_zero(
        &mut self,
        host: &mut FheHost,
        principal: Principal,
        ctx: &CallContext,
    ) -> Result<Handle, HostError> {
        if let Some(handle) = self.balances.get(&principal) {
            return Ok(*handle);
        }
        let zero = host.trivial_encrypt(0, CiphertextKind::Uint64, ctx)?;
        host.allow_self(zero, ctx)?;
        self.balances.insert(principal, zero);
        Ok(zero)
    }

    /// Transfers an externally encrypted amount from the caller to `to`.
    ///
    /// When the caller's balance is insufficient, an encrypted zero moves
    /// instead; the outcome is indistinguishable on-chain. Both parties
    /// receive decrypt grants on their new balances.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a zero recipient and `InvalidProof`
    /// for a mismatched input.
    pub fn transfer(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        to: Principal,
        amount: &EncryptedInput,
    ) -> Result<(), HostError> {
        if to.is_zero() {
            return Err(HostError::InvalidArgument {
                field: "to",
                reason: "zero address".to_string(),
            });
        }
        let ctx = CallContext::new(self.address, caller)?;
        let requested = host.from_external(amount.handle, &amount.proof, &ctx)?;
        host.allow_self(requested, &ctx)?;

        let from_balance = self.balance_or_zero(host, caller, &ctx)?;
        let to_balance = self.balance_or_zero(host, to, &ctx)?;

        let has_funds = host.compare(CmpOp::Le, requested, Operand::Handle(from_balance), &ctx)?;
        host.allow_self(has_funds, &ctx)?;
        let zero = host.trivial_encrypt(0, CiphertextKind::Uint64, &ctx)?;
        host.allow_self(zero, &ctx)?;
        let moved = host.select(has_funds, requested, zero, &ctx)?;
        host.allow_self(moved, &ctx)?;

        let new_from = host.binary(BinaryOp::Sub, from_balance, Operand::Handle(moved), &ctx)?;
        host.allow_self(new_from, &ctx)?;
        host.allow(new_from, caller, &ctx)?;

        let new_to = host.binary(BinaryOp::Add, to_balance, Operand::Handle(moved), &ctx)?;
        host.allow_self(new_to, &ctx)?;
        host.allow(new_to, to, &ctx)?;

        self.balances.insert(caller, new_from);
        self.balances.insert(to, new_to);
        debug!(from = %caller, to = %to, "confidential transfer settled");
        Ok(())
    }
}
