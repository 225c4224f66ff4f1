//! Host-level error type aggregating the module error taxonomy.

use thiserror::Error;

use crate::acl::AclError;
use crate::eval::EvalError;
use crate::handle::Handle;
use crate::proof::ProofError;
use crate::registry::RegistryError;

/// Errors surfaced by host entry points.
///
/// Every variant is terminal for the triggering call: the host makes no
/// partial state change and nothing is retried. The taxonomy maps onto the
/// policy classes the examples illustrate: missing grants
/// ([`AclError::PermissionDenied`]), proof misuse
/// ([`ProofError::InvalidProof`]), and malformed arguments
/// ([`HostError::InvalidArgument`] and the [`EvalError`] shapes).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Permission gate or grant issuance failure.
    #[error(transparent)]
    Acl(#[from] AclError),

    /// Input-proof verification failure.
    #[error(transparent)]
    Proof(#[from] ProofError),

    /// Operand-shape or evaluation failure.
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// Registry capacity or uniqueness failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The handle has no record: never minted here, or never admitted.
    #[error("unknown handle: {handle}")]
    UnknownHandle {
        /// The unrecognized handle.
        handle: Handle,
    },

    /// An argument failed validation before any state was touched.
    #[error("invalid argument: {field}: {reason}")]
    InvalidArgument {
        /// The offending argument.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl HostError {
    /// Returns `true` for a missing-grant denial.
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Acl(AclError::PermissionDenied { .. }))
    }

    /// Returns `true` for a proof/handle/submitter binding failure.
    #[must_use]
    pub const fn is_invalid_proof(&self) -> bool {
        matches!(
            self,
            Self::Proof(ProofError::InvalidProof { .. } | ProofError::Malformed { .. })
        )
    }
}
