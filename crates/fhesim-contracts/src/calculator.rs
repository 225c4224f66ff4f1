//! Scalar calculator over one encrypted accumulator.
//!
//! Exercises the arithmetic operator surface against public scalars,
//! including the argument checks around division: the coprocessor exposes
//! no encrypted-divisor circuit, and a zero scalar divisor or modulus is
//! rejected before anything is derived.

use fhesim_core::{
    BinaryOp, CallContext, EncryptedInput, FheHost, Handle, HostError, Operand, Principal, UnaryOp,
};

/// One encrypted `u64` accumulator with scalar operations.
#[derive(Debug)]
pub struct Calculator {
    address: Principal,
    value: Option<Handle>,
}

impl Calculator {
    /// Deploys the calculator at `address`.
    #[must_use]
    pub fn new(address: Principal) -> Self {
        Self {
            address,
            value: None,
        }
    }

    /// The contract address.
    #[must_use]
    pub const fn address(&self) -> Principal {
        self.address
    }

    /// The accumulator handle, if initialized.
    #[must_use]
    pub const fn value(&self) -> Option<Handle> {
        self.value
    }

    fn current(&self) -> Result<Handle, HostError> {
        self.value.ok_or(HostError::InvalidArgument {
            field: "value",
            reason: "calculator not initialized".to_string(),
        })
    }

    /// Initializes the accumulator from an externally encrypted value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProof` for a mismatched input.
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
        self.value = Some(handle);
        Ok(())
    }

    /// Applies a binary operator with a public scalar right operand and
    /// re-grants the result to the caller.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` before `set`, `DivisionByZero` for a zero
    /// divisor or modulus, and propagates gate failures from the host.
    pub fn apply_scalar(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        op: BinaryOp,
        scalar: u64,
    ) -> Result<(), HostError> {
        let ctx = CallContext::new(self.address, caller)?;
        let next = host.binary(op, self.current()?, Operand::Scalar(scalar.into()), &ctx)?;
        host.allow_self(next, &ctx)?;
        host.allow(next, caller, &ctx)?;
        self.value = Some(next);
        Ok(())
    }

    /// Applies a unary operator and re-grants the result to the caller.
    ///
    /// # Errors
    ///
    /// As [`Calculator::apply_scalar`], minus the divisor shapes.
    pub fn apply_unary(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        op: UnaryOp,
    ) -> Result<(), HostError> {
        let ctx = CallContext::new(self.address, caller)?;
        let next = host.unary(op, self.current()?, &ctx)?;
        host.allow_self(next, &ctx)?;
        host.allow(next, caller, &ctx)?;
        self.value = Some(next);
        Ok(())
    }
}
