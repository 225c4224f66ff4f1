//! Encrypted yes/no ballot with a tally only the authority can read.
//!
//! Votes arrive as encrypted booleans; the tally is accumulated through
//! select-then-add so no individual vote is ever revealed, and the total
//! stays encrypted until the authority closes the ballot.

use std::collections::HashSet;

use fhesim_core::{
    BinaryOp, CallContext, CiphertextKind, EncryptedInput, EvalError, FheHost, Handle, HostError,
    Operand, Principal,
};

/// Yes/no ballot box accumulating an encrypted `u64` tally.
#[derive(Debug)]
pub struct BallotBox {
    address: Principal,
    authority: Principal,
    tally: Handle,
    voted: HashSet<Principal>,
    open: bool,
}

impl BallotBox {
    /// Deploys the ballot box at `address`, run by `authority`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for zero addresses.
    pub fn new(
        host: &mut FheHost,
        address: Principal,
        authority: Principal,
    ) -> Result<Self, HostError> {
        let ctx = CallContext::new(address, authority)?;
        let tally = host.trivial_encrypt(0, CiphertextKind::Uint64, &ctx)?;
        host.allow_self(tally, &ctx)?;
        Ok(Self {
            address,
            authority,
            tally,
            voted: HashSet::new(),
            open: true,
        })
    }

    /// The contract address.
    #[must_use]
    pub const fn address(&self) -> Principal {
        self.address
    }

    /// The encrypted tally handle.
    #[must_use]
    pub const fn tally(&self) -> Handle {
        self.tally
    }

    /// Casts an encrypted yes/no vote. Each principal votes once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` after close or on a repeat vote,
    /// `KindMismatch` when the submitted ciphertext is not a boolean
    /// (checked before admission, so a rejected vote leaves no trace on
    /// the host), and `InvalidProof` for a mismatched input.
    pub fn cast(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        input: &EncryptedInput,
    ) -> Result<(), HostError> {
        if !self.open {
            return Err(HostError::InvalidArgument {
                field: "ballot",
                reason: "ballot is closed".to_string(),
            });
        }
        if self.voted.contains(&caller) {
            return Err(HostError::InvalidArgument {
                field: "caller",
                reason: "already voted".to_string(),
            });
        }
        // Reject non-boolean ciphertexts before admitting anything; the
        // kind is stamped into the handle itself.
        match input.handle.kind() {
            Some(CiphertextKind::Bool) => {}
            Some(actual) => {
                return Err(EvalError::KindMismatch {
                    expected: CiphertextKind::Bool,
                    actual,
                }
                .into())
            }
            None => {
                return Err(HostError::InvalidArgument {
                    field: "vote",
                    reason: "unrecognized ciphertext kind".to_string(),
                })
            }
        }
        let ctx = CallContext::new(self.address, caller)?;
        let vote = host.from_external(input.handle, &input.proof, &ctx)?;
        host.allow_self(vote, &ctx)?;

        let one = host.trivial_encrypt(1, CiphertextKind::Uint64, &ctx)?;
        host.allow_self(one, &ctx)?;
        let zero = host.trivial_encrypt(0, CiphertextKind::Uint64, &ctx)?;
        host.allow_self(zero, &ctx)?;

        let delta = host.select(vote, one, zero, &ctx)?;
        host.allow_self(delta, &ctx)?;
        let tally = host.binary(BinaryOp::Add, self.tally, Operand::Handle(delta), &ctx)?;
        host.allow_self(tally, &ctx)?;

        self.tally = tally;
        self.voted.insert(caller);
        Ok(())
    }

    /// Closes the ballot and reveals the tally to the authority.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when called by anyone but the authority.
    pub fn close(&mut self, host: &mut FheHost, caller: Principal) -> Result<(), HostError> {
        if caller != self.authority {
            return Err(HostError::InvalidArgument {
                field: "caller",
                reason: "only the authority may close the ballot".to_string(),
            });
        }
        let ctx = CallContext::new(self.address, caller)?;
        host.allow(self.tally, self.authority, &ctx)?;
        self.open = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fhesim_core::HostConfig;

    use super::*;

    fn authority() -> Principal {
        Principal::from_label("authority")
    }

    fn deploy() -> (FheHost, BallotBox) {
        let mut host = FheHost::new(HostConfig::default());
        let ballot = BallotBox::new(&mut host, Principal::from_label("ballot"), authority())
            .expect("deploy");
        (host, ballot)
    }

    fn vote(host: &mut FheHost, ballot: &mut BallotBox, voter: &str, yes: bool) {
        let voter = Principal::from_label(voter);
        let input = host
            .create_encrypted_input(ballot.address(), voter)
            .add_bool(yes)
            .encrypt_one()
            .expect("encrypt");
        ballot.cast(host, voter, &input).expect("cast");
    }

    #[test]
    fn tally_counts_yes_votes() {
        let (mut host, mut ballot) = deploy();
        vote(&mut host, &mut ballot, "alice", true);
        vote(&mut host, &mut ballot, "bob", false);
        vote(&mut host, &mut ballot, "carol", true);
        ballot.close(&mut host, authority()).expect("close");
        assert_eq!(host.decrypt(ballot.tally(), authority()), Ok(2));
    }

    #[test]
    fn tally_is_hidden_until_close_and_from_voters() {
        let (mut host, mut ballot) = deploy();
        vote(&mut host, &mut ballot, "alice", true);
        let alice = Principal::from_label("alice");
        assert!(host
            .decrypt(ballot.tally(), authority())
            .expect_err("not yet revealed")
            .is_permission_denied());
        ballot.close(&mut host, authority()).expect("close");
        assert!(host
            .decrypt(ballot.tally(), alice)
            .expect_err("voters never see the tally")
            .is_permission_denied());
    }

    #[test]
    fn double_votes_are_rejected() {
        let (mut host, mut ballot) = deploy();
        vote(&mut host, &mut ballot, "alice", true);
        let alice = Principal::from_label("alice");
        let input = host
            .create_encrypted_input(ballot.address(), alice)
            .add_bool(true)
            .encrypt_one()
            .expect("encrypt");
        let err = ballot.cast(&mut host, alice, &input).expect_err("second vote");
        assert!(matches!(err, HostError::InvalidArgument { field: "caller", .. }));
    }

    #[test]
    fn votes_after_close_are_rejected() {
        let (mut host, mut ballot) = deploy();
        ballot.close(&mut host, authority()).expect("close");
        let alice = Principal::from_label("alice");
        let input = host
            .create_encrypted_input(ballot.address(), alice)
            .add_bool(true)
            .encrypt_one()
            .expect("encrypt");
        let err = ballot.cast(&mut host, alice, &input).expect_err("closed");
        assert!(matches!(err, HostError::InvalidArgument { field: "ballot", .. }));
    }

    #[test]
    fn only_the_authority_closes() {
        let (mut host, mut ballot) = deploy();
        let err = ballot
            .close(&mut host, Principal::from_label("alice"))
            .expect_err("not the authority");
        assert!(matches!(err, HostError::InvalidArgument { field: "caller", .. }));
    }

    #[test]
    fn non_boolean_votes_are_rejected() {
        let (mut host, mut ballot) = deploy();
        let alice = Principal::from_label("alice");
        let input = host
            .create_encrypted_input(ballot.address(), alice)
            .add_u64(1)
            .encrypt_one()
            .expect("encrypt");
        let err = ballot.cast(&mut host, alice, &input).expect_err("not a bool");
        assert_eq!(
            err,
            HostError::Eval(EvalError::KindMismatch {
                expected: CiphertextKind::Bool,
                actual: CiphertextKind::Uint64,
            })
        );
        // The rejected vote was never admitted and the voter may retry.
        assert!(matches!(
            host.decrypt(input.handle, alice),
            Err(HostError::UnknownHandle { .. })
        ));
        vote(&mut host, &mut ballot, "alice", true);
    }
}
