//! Two-party adder: each party submits its own encrypted operand.
//!
//! Input proofs are per-submitter, so neither party can smuggle in a
//! ciphertext encrypted by the other. The sum is revealed to both parties
//! once computed.

use fhesim_core::{
    BinaryOp, CallContext, EncryptedInput, FheHost, Handle, HostError, Operand, Principal,
};

/// Adds two encrypted `u64` operands submitted by different principals.
#[derive(Debug)]
pub struct Adder {
    address: Principal,
    lhs: Option<(Principal, Handle)>,
    rhs: Option<(Principal, Handle)>,
    sum: Option<Handle>,
}

impl Adder {
    /// Deploys the adder at `address`.
    #[must_use]
    pub fn new(address: Principal) -> Self {
        Self {
            address,
            lhs: None,
            rhs: None,
            sum: None,
        }
    }

    /// The contract address.
    #[must_use]
    pub const fn address(&self) -> Principal {
        self.address
    }

    /// The computed sum handle, once [`Adder::compute`] has run.
    #[must_use]
    pub const fn sum(&self) -> Option<Handle> {
        self.sum
    }

    fn admit(
        &self,
        host: &mut FheHost,
        caller: Principal,
        input: &EncryptedInput,
    ) -> Result<Handle, HostError> {
        let ctx = CallContext::new(self.address, caller)?;
        let handle = host.from_external(input.handle, &input.proof, &ctx)?;
        host.allow_self(handle, &ctx)?;
        Ok(handle)
    }

    /// Submits the left operand.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProof` for an input not encrypted for this contract
    /// and caller.
    pub fn set_lhs(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        input: &EncryptedInput,
    ) -> Result<(), HostError> {
        let handle = self.admit(host, caller, input)?;
        self.lhs = Some((caller, handle));
        Ok(())
    }

    /// Submits the right operand.
    ///
    /// # Errors
    ///
    /// As [`Adder::set_lhs`].
    pub fn set_rhs(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        input: &EncryptedInput,
    ) -> Result<(), HostError> {
        let handle = self.admit(host, caller, input)?;
        self.rhs = Some((caller, handle));
        Ok(())
    }

    /// Computes the sum and reveals it to both submitters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` until both operands are submitted.
    pub fn compute(&mut self, host: &mut FheHost, caller: Principal) -> Result<(), HostError> {
        let (Some((lhs_owner, lhs)), Some((rhs_owner, rhs))) = (self.lhs, self.rhs) else {
            return Err(HostError::InvalidArgument {
                field: "operands",
                reason: "both operands must be submitted before compute".to_string(),
            });
        };
        let ctx = CallContext::new(self.address, caller)?;
        let sum = host.binary(BinaryOp::Add, lhs, Operand::Handle(rhs), &ctx)?;
        host.allow_self(sum, &ctx)?;
        host.allow(sum, lhs_owner, &ctx)?;
        host.allow(sum, rhs_owner, &ctx)?;
        self.sum = Some(sum);
        Ok(())
    }
}
