//! Owner-managed decrypt sharing over one encrypted value.
//!
//! Demonstrates the revocable side of the grant model: user decrypt
//! grants can be withdrawn by the contract that issued them, while the
//! contract's own self-grant stays in place.

use fhesim_core::{CallContext, EncryptedInput, FheHost, Handle, HostError, Principal};

/// One encrypted `u64` secret with an owner-managed viewer list.
#[derive(Debug)]
pub struct SharedVault {
    address: Principal,
    owner: Principal,
    secret: Option<Handle>,
}

impl SharedVault {
    /// Deploys the vault at `address`, owned by `owner`.
    #[must_use]
    pub fn new(address: Principal, owner: Principal) -> Self {
        Self {
            address,
            owner,
            secret: None,
        }
    }

    /// The contract address.
    #[must_use]
    pub const fn address(&self) -> Principal {
        self.address
    }

    fn require_owner(&self, caller: Principal) -> Result<(), HostError> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(HostError::InvalidArgument {
                field: "caller",
                reason: "only the owner may manage the vault".to_string(),
            })
        }
    }

    fn current(&self) -> Result<Handle, HostError> {
        self.secret.ok_or(HostError::InvalidArgument {
            field: "secret",
            reason: "vault is empty".to_string(),
        })
    }

    /// Stores an externally encrypted secret. Owner only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-owner caller and `InvalidProof`
    /// for a mismatched input.
    pub fn store(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        input: &EncryptedInput,
    ) -> Result<(), HostError> {
        self.require_owner(caller)?;
        let ctx = CallContext::new(self.address, caller)?;
        let secret = host.from_external(input.handle, &input.proof, &ctx)?;
        host.allow_self(secret, &ctx)?;
        host.allow(secret, self.owner, &ctx)?;
        self.secret = Some(secret);
        Ok(())
    }

    /// Grants `viewer` decrypt access to the secret. Owner only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-owner caller or an empty vault.
    pub fn share(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        viewer: Principal,
    ) -> Result<(), HostError> {
        self.require_owner(caller)?;
        let ctx = CallContext::new(self.address, caller)?;
        host.allow(self.current()?, viewer, &ctx)?;
        Ok(())
    }

    /// Revokes a previously shared decrypt grant. Owner only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-owner caller or an empty vault,
    /// and `GrantNotFound` when `viewer` was never granted.
    pub fn unshare(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        viewer: Principal,
    ) -> Result<(), HostError> {
        self.require_owner(caller)?;
        let ctx = CallContext::new(self.address, caller)?;
        host.revoke(self.current()?, viewer, &ctx)?;
        Ok(())
    }

    /// The stored secret handle, if any.
    #[must_use]
    pub const fn secret(&self) -> Option<Handle> {
        self.secret
    }
}

#[cfg(test)]
mod tests {
    use fhesim_core::{AclError, HostConfig};

    use super::*;

    fn owner() -> Principal {
        Principal::from_label("owner")
    }

    fn viewer() -> Principal {
        Principal::from_label("viewer")
    }

    fn deploy_with_secret(value: u64) -> (FheHost, SharedVault) {
        let mut host = FheHost::new(HostConfig::default());
        let mut vault = SharedVault::new(Principal::from_label("vault"), owner());
        let input = host
            .create_encrypted_input(vault.address(), owner())
            .add_u64(value)
            .encrypt_one()
            .expect("encrypt");
        vault.store(&mut host, owner(), &input).expect("store");
        (host, vault)
    }

    #[test]
    fn sharing_grants_decrypt_and_revoking_withdraws_it() {
        let (mut host, mut vault) = deploy_with_secret(77);
        let secret = vault.secret().expect("stored");

        assert!(host.decrypt(secret, viewer()).expect_err("not shared").is_permission_denied());

        vault.share(&mut host, owner(), viewer()).expect("share");
        assert_eq!(host.decrypt(secret, viewer()), Ok(77));

        vault.unshare(&mut host, owner(), viewer()).expect("unshare");
        assert!(host.decrypt(secret, viewer()).expect_err("revoked").is_permission_denied());

        // The owner and the contract keep their access.
        assert_eq!(host.decrypt(secret, owner()), Ok(77));
        assert_eq!(host.decrypt(secret, vault.address()), Ok(77));
    }

    #[test]
    fn only_the_owner_manages_the_viewer_list() {
        let (mut host, mut vault) = deploy_with_secret(77);
        let err = vault
            .share(&mut host, viewer(), viewer())
            .expect_err("not the owner");
        assert!(matches!(err, HostError::InvalidArgument { field: "caller", .. }));
    }

    #[test]
    fn revoking_an_absent_grant_reports_grant_not_found() {
        let (mut host, mut vault) = deploy_with_secret(77);
        let err = vault
            .unshare(&mut host, owner(), viewer())
            .expect_err("never shared");
        assert!(matches!(err, HostError::Acl(AclError::GrantNotFound { .. })));
    }

    #[test]
    fn restoring_replaces_the_secret_and_its_grants() {
        let (mut host, mut vault) = deploy_with_secret(77);
        vault.share(&mut host, owner(), viewer()).expect("share");
        let old_secret = vault.secret().expect("stored");

        let input = host
            .create_encrypted_input(vault.address(), owner())
            .add_u64(88)
            .encrypt_one()
            .expect("encrypt");
        vault.store(&mut host, owner(), &input).expect("restore");
        let new_secret = vault.secret().expect("stored");
        assert_ne!(old_secret, new_secret);

        // The viewer's grant was on the old handle; the new one starts
        // unshared.
        assert!(host
            .decrypt(new_secret, viewer())
            .expect_err("not shared")
            .is_permission_denied());
    }
}
