//! Encrypted comparisons: min, max, and equality over two operands.
//!
//! Comparisons derive `Bool` handles; branch selection goes through the
//! ternary select so the comparison outcome itself is never revealed to
//! the contract.

use fhesim_core::{
    CallContext, CmpOp, EncryptedInput, FheHost, Handle, HostError, Operand, Principal,
};

/// Compares two encrypted `u64` values submitted in one batch.
#[derive(Debug)]
pub struct Comparator {
    address: Principal,
    operands: Option<(Handle, Handle)>,
}

impl Comparator {
    /// Deploys the comparator at `address`.
    #[must_use]
    pub fn new(address: Principal) -> Self {
        Self {
            address,
            operands: None,
        }
    }

    /// The contract address.
    #[must_use]
    pub const fn address(&self) -> Principal {
        self.address
    }

    fn current(&self) -> Result<(Handle, Handle), HostError> {
        self.operands.ok_or(HostError::InvalidArgument {
            field: "operands",
            reason: "operands not submitted".to_string(),
        })
    }

    /// Submits both operands as a two-value encrypted batch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` unless the batch holds exactly two values
    /// and `InvalidProof` for mismatched inputs.
    pub fn submit(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        inputs: &[EncryptedInput],
    ) -> Result<(), HostError> {
        let [a, b] = inputs else {
            return Err(HostError::InvalidArgument {
                field: "inputs",
                reason: format!("expected exactly two operands, got {}", inputs.len()),
            });
        };
        let ctx = CallContext::new(self.address, caller)?;
        let lhs = host.from_external(a.handle, &a.proof, &ctx)?;
        host.allow_self(lhs, &ctx)?;
        let rhs = host.from_external(b.handle, &b.proof, &ctx)?;
        host.allow_self(rhs, &ctx)?;
        self.operands = Some((lhs, rhs));
        Ok(())
    }

    /// Derives the maximum of the two operands and reveals it to the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` before [`Comparator::submit`].
    pub fn max(&self, host: &mut FheHost, caller: Principal) -> Result<Handle, HostError> {
        self.pick(host, caller, CmpOp::Ge)
    }

    /// Derives the minimum of the two operands and reveals it to the
    /// caller.
    ///
    /// # Errors
    ///
    /// As [`Comparator::max`].
    pub fn min(&self, host: &mut FheHost, caller: Principal) -> Result<Handle, HostError> {
        self.pick(host, caller, CmpOp::Le)
    }

    fn pick(
        &self,
        host: &mut FheHost,
        caller: Principal,
        op: CmpOp,
    ) -> Result<Handle, HostError> {
        let (lhs, rhs) = self.current()?;
        let ctx = CallContext::new(self.address, caller)?;
        let cond = host.compare(op, lhs, Operand::Handle(rhs), &ctx)?;
        host.allow_self(cond, &ctx)?;
        let picked = host.select(cond, lhs, rhs, &ctx)?;
        host.allow_self(picked, &ctx)?;
        host.allow(picked, caller, &ctx)?;
        Ok(picked)
    }

    /// Derives an encrypted equality bit and reveals it to the caller.
    ///
    /// # Errors
    ///
    /// As [`Comparator::max`].
    pub fn is_equal(&self, host: &mut FheHost, caller: Principal) -> Result<Handle, HostError> {
        let (lhs, rhs) = self.current()?;
        let ctx = CallContext::new(self.address, caller)?;
        let eq = host.compare(CmpOp::Eq, lhs, Operand::Handle(rhs), &ctx)?;
        host.allow_self(eq, &ctx)?;
        host.allow(eq, caller, &ctx)?;
        Ok(eq)
    }
}
