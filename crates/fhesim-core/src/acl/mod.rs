//! Access-control list and permission gate for ciphertext handles.
//!
//! Every handle starts with an empty grant set, including handles derived
//! from granted operands. Two grant kinds exist:
//!
//! - **Contract self-grant** (`allow_self`): the contract may use the handle
//!   as an operand and decrypt it. Never revoked.
//! - **User grant** (`allow`): a principal may decrypt the handle. Records
//!   the issuing contract; only that contract may revoke it.
//!
//! The permission gate ([`AccessControl::require`]) is a pure check: it
//! either returns the handle for further processing or fails closed with
//! [`AclError::PermissionDenied`]. Grants are additive and never
//! retroactive — an operation that was denied stays denied, and a later
//! grant only affects later operations.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handle::{Handle, Principal};


/// The action a principal requests on a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Use the handle as an operand of a homomorphic operation.
    Compute,
    /// Obtain the plaintext behind the handle.
    Decrypt,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compute => write!(f, "compute"),
            Self::Decrypt => write!(f, "decrypt"),
        }
    }
}

/// Errors raised by the permission gate and grant issuance.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AclError {
    /// No grant record exists for (handle, principal, action).
    #[error("permission denied: {principal} may not {action} {handle}")]
    PermissionDenied {
        /// The handle the principal tried to use.
        handle: Handle,
        /// The requesting principal.
        principal: Principal,
        /// The requested action.
        action: Action,
    },

    /// A revoke was attempted by a contract other than the grant's issuer.
    #[error("revoke denied: {caller} did not issue the {handle} grant for {principal}")]
    RevokeDenied {
        /// The handle whose grant was targeted.
        handle: Handle,
        /// The principal whose grant was targeted.
        principal: Principal,
        /// The contract attempting the revoke.
        caller: Principal,
    },

    /// A revoke targeted a grant that does not exist.
    #[error("no user grant on {handle} for {principal}")]
    GrantNotFound {
        /// The handle whose grant was targeted.
        handle: Handle,
        /// The principal whose grant was targeted.
        principal: Principal,
    },
}

/// Per-handle grant records.
#[derive(Debug, Default)]
struct HandleGrants {
    /// Contracts holding a self-grant (compute + decrypt).
    contracts: HashSet<Principal>,
    /// User decrypt grants, keyed by grantee, recording the issuing contract.
    users: HashMap<Principal, Principal>,
}

/// Access-control list over all registered handles.
#[derive(Debug, Default)]
pub struct AccessControl {
    grants: HashMap<Handle, HandleGrants>,
}

impl AccessControl {
    /// Creates an empty ACL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The permission gate: pure check that `principal` may perform
    /// `action` on `handle`.
    ///
    /// Returns the handle unchanged so callers can thread it into the
    /// guarded operation.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when no matching grant record exists.
    pub fn require(
        &self,
        handle: Handle,
        principal: Principal,
        action: Action,
    ) -> Result<Handle, AclError> {
        if self.is_allowed(handle, principal, action) {
            Ok(handle)
        } else {
            Err(AclError::PermissionDenied {
                handle,
                principal,
                action,
            })
        }
    }

    /// Returns `true` if a grant record permits (handle, principal, action).
    #[must_use]
    pub fn is_allowed(&self, handle: Handle, principal: Principal, action: Action) -> bool {
        let Some(grants) = self.grants.get(&handle) else {
            return false;
        };
        match action {
            Action::Compute => grants.contracts.contains(&principal),
            Action::Decrypt => {
                grants.contracts.contains(&principal) || grants.users.contains_key(&principal)
            }
        }
    }

    /// Records a contract self-grant: `contract` may compute on and
    /// decrypt `handle`. Additive; self-grants are never revoked.
    pub fn allow_contract(&mut self, handle: Handle, contract: Principal) {
        self.grants.entry(handle).or_default().contracts.insert(contract);
    }

    /// Records a user decrypt grant on `handle` for `principal`, issued by
    /// `issuer`. Re-granting overwrites the recorded issuer.
    pub fn allow_user(&mut self, handle: Handle, principal: Principal, issuer: Principal) {
        self.grants
            .entry(handle)
            .or_default()
            .users
            .insert(principal, issuer);
    }

    /// Revokes a user decrypt grant.
    ///
    /// # Errors
    ///
    /// Returns `GrantNotFound` when no user grant exists and `RevokeDenied`
    /// when `caller` is not the issuing contract. Contract self-grants are
    /// not revocable through this path.
    pub fn revoke_user(
        &mut self,
        handle: Handle,
        principal: Principal,
        caller: Principal,
    ) -> Result<(), AclError> {
        let grants = self
            .grants
            .get_mut(&handle)
            .ok_or(AclError::GrantNotFound { handle, principal })?;
        let issuer = *grants
            .users
            .get(&principal)
            .ok_or(AclError::GrantNotFound { handle, principal })?;
        if issuer != caller {
            return Err(AclError::RevokeDenied {
                handle,
                principal,
                caller,
            });
        }
        grants.users.remove(&principal);
        Ok(())
    }

    /// Returns `true` if any grant record exists for the handle.
    #[must_use]
    pub fn has_grants(&self, handle: Handle) -> bool {
        self.grants
            .get(&handle)
            .is_some_and(|g| !g.contracts.is_empty() || !g.users.is_empty())
    }
}
