//! Encrypted counter: the canonical handle-lifecycle example.
//!
//! [`Counter`] shows the full discipline — admit the input, self-grant,
//! derive, re-grant the result. [`ForgetfulCounter`] is its deliberate
//! foil: it derives correctly but skips grant issuance on the result, so
//! every read of the new count is denied.

use fhesim_core::{
    BinaryOp, CallContext, EncryptedInput, FheHost, Handle, HostError, Operand, Principal,
};

/// Counter holding one encrypted `u64`.
#[derive(Debug)]
pub struct Counter {
    address: Principal,
    count: Option<Handle>,
}

impl Counter {
    /// Deploys the counter at `address`.
    #[must_use]
    pub fn new(address: Principal) -> Self {
        Self {
            address,
            count: None,
        }
    }

    /// The contract address.
    #[must_use]
    pub const fn address(&self) -> Principal {
        self.address
    }

    /// The current count handle, if initialized.
    #[must_use]
    pub const fn count(&self) -> Option<Handle> {
        self.count
    }

    fn current(&self) -> Result<Handle, HostError> {
        self.count.ok_or(HostError::InvalidArgument {
            field: "count",
            reason: "counter not initialized".to_string(),
        })
    }

    /// Sets the count from an externally encrypted value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProof` when the input was not encrypted for this
    /// contract and caller.
    pub fn set(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        input: &EncryptedInput,
    ) -> Result<(), HostError> {
        let ctx = CallContext::new(self.address, caller)?;
        let handle = host.from_external(input.handle, &input.proof, &ctx)?;
        host.allow_self(handle, &ctx)?;
        host.allow(handle, caller, &ctx)?;
        self.count = Some(handle);
        Ok(())
    }

    /// Adds one to the count and re-grants the derived handle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` before `set`, and propagates gate
    /// failures from the host.
    pub fn increment(&mut self, host: &mut FheHost, caller: Principal) -> Result<(), HostError> {
        let ctx = CallContext::new(self.address, caller)?;
        let next = host.binary(BinaryOp::Add, self.current()?, Operand::Scalar(1), &ctx)?;
        host.allow_self(next, &ctx)?;
        host.allow(next, caller, &ctx)?;
        self.count = Some(next);
        Ok(())
    }

    /// Adds an externally encrypted amount to the count.
    ///
    /// # Errors
    ///
    /// As [`Counter::increment`], plus `InvalidProof` for a mismatched
    /// input.
    pub fn increment_by(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        input: &EncryptedInput,
    ) -> Result<(), HostError> {
        let ctx = CallContext::new(self.address, caller)?;
        let amount = host.from_external(input.handle, &input.proof, &ctx)?;
        host.allow_self(amount, &ctx)?;
        let next = host.binary(
            BinaryOp::Add,
            self.current()?,
            Operand::Handle(amount),
            &ctx,
        )?;
        host.allow_self(next, &ctx)?;
        host.allow(next, caller, &ctx)?;
        self.count = Some(next);
        Ok(())
    }
}

/// Counter that forgets to re-grant derived handles.
///
/// After [`ForgetfulCounter::increment`], nobody — the contract included —
/// can decrypt or build on the new count. Kept as the minimal reproduction
/// of the most common grant-discipline mistake.
#[derive(Debug)]
pub struct ForgetfulCounter {
    address: Principal,
    count: Option<Handle>,
}

impl ForgetfulCounter {
    /// Deploys the counter at `address`.
    #[must_use]
    pub fn new(address: Principal) -> Self {
        Self {
            address,
            count: None,
        }
    }

    /// The current count handle, if initialized.
    #[must_use]
    pub const fn count(&self) -> Option<Handle> {
        self.count
    }

    /// Sets the count, correctly granting the admitted handle.
    ///
    /// # Errors
    ///
    /// As [`Counter::set`].
    pub fn set(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        input: &EncryptedInput,
    ) -> Result<(), HostError> {
        let ctx = CallContext::new(self.address, caller)?;
        let handle = host.from_external(input.handle, &input.proof, &ctx)?;
        host.allow_self(handle, &ctx)?;
        self.count = Some(handle);
        Ok(())
    }

    /// Adds one to the count but issues no grants on the result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` before `set`.
    pub fn increment(&mut self, host: &mut FheHost, caller: Principal) -> Result<(), HostError> {
        let ctx = CallContext::new(self.address, caller)?;
        let current = self.count.ok_or(HostError::InvalidArgument {
            field: "count",
            reason: "counter not initialized".to_string(),
        })?;
        let next = host.binary(BinaryOp::Add, current, Operand::Scalar(1), &ctx)?;
        // Missing: host.allow_self(next, ...) and host.allow(next, caller, ...).
        self.count = Some(next);
        Ok(())
    }
}
