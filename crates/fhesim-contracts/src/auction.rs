//! Sealed-bid auction tracking the encrypted highest bid.
//!
//! Bids stay encrypted end to end; the running maximum is maintained with
//! compare-then-select so the contract never learns which bid won until
//! the beneficiary closes the auction and decrypts the result.

use tracing::debug;

use fhesim_core::{
    CallContext, CmpOp, EncryptedInput, FheHost, Handle, HostError, Operand, Principal,
};

/// Sealed-bid auction over encrypted `u64` bids.
#[derive(Debug)]
pub struct SealedBidAuction {
    address: Principal,
    beneficiary: Principal,
    highest: Option<Handle>,
    open: bool,
}

impl SealedBidAuction {
    /// Deploys the auction at `address` for `beneficiary`.
    #[must_use]
    pub fn new(address: Principal, beneficiary: Principal) -> Self {
        Self {
            address,
            beneficiary,
            highest: None,
            open: true,
        }
    }

    /// The contract address.
    #[must_use]
    pub const fn address(&self) -> Principal {
        self.address
    }

    /// The encrypted highest-bid handle, once at least one bid is in.
    #[must_use]
    pub const fn highest_bid(&self) -> Option<Handle> {
        self.highest
    }

    /// Places an encrypted bid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` after close and `InvalidProof` for an
    /// input not encrypted for this contract and bidder.
    pub fn bid(
        &mut self,
        host: &mut FheHost,
        caller: Principal,
        input: &EncryptedInput,
    ) -> Result<(), HostError> {
        if !self.open {
            return Err(HostError::InvalidArgument {
                field: "auction",
                reason: "auction is closed".to_string(),
            });
        }
        let ctx = CallContext::new(self.address, caller)?;
        let bid = host.from_external(input.handle, &input.proof, &ctx)?;
        host.allow_self(bid, &ctx)?;

        let highest = match self.highest {
            None => bid,
            Some(current) => {
                let outbid = host.compare(CmpOp::Gt, bid, Operand::Handle(current), &ctx)?;
                host.allow_self(outbid, &ctx)?;
                let winner = host.select(outbid, bid, current, &ctx)?;
                host.allow_self(winner, &ctx)?;
                winner
            }
        };
        self.highest = Some(highest);
        debug!(bidder = %caller, "sealed bid recorded");
        Ok(())
    }

    /// Closes the auction and reveals the highest bid to the beneficiary.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when called by anyone but the beneficiary
    /// or before any bid was placed.
    pub fn close(&mut self, host: &mut FheHost, caller: Principal) -> Result<(), HostError> {
        if caller != self.beneficiary {
            return Err(HostError::InvalidArgument {
                field: "caller",
                reason: "only the beneficiary may close the auction".to_string(),
            });
        }
        let highest = self.highest.ok_or(HostError::InvalidArgument {
            field: "auction",
            reason: "no bids placed".to_string(),
        })?;
        let ctx = CallContext::new(self.address, caller)?;
        host.allow(highest, self.beneficiary, &ctx)?;
        self.open = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fhesim_core::HostConfig;

    use super::*;

    fn beneficiary() -> Principal {
        Principal::from_label("beneficiary")
    }

    fn deploy() -> (FheHost, SealedBidAuction) {
        let host = FheHost::new(HostConfig::default());
        let auction = SealedBidAuction::new(Principal::from_label("auction"), beneficiary());
        (host, auction)
    }

    fn place_bid(host: &mut FheHost, auction: &mut SealedBidAuction, bidder: &str, amount: u64) {
        let bidder = Principal::from_label(bidder);
        let input = host
            .create_encrypted_input(auction.address(), bidder)
            .add_u64(amount)
            .encrypt_one()
            .expect("encrypt");
        auction.bid(host, bidder, &input).expect("bid");
    }

    #[test]
    fn beneficiary_learns_the_highest_bid() {
        let (mut host, mut auction) = deploy();
        place_bid(&mut host, &mut auction, "alice", 300);
        place_bid(&mut host, &mut auction, "bob", 550);
        place_bid(&mut host, &mut auction, "carol", 420);
        auction.close(&mut host, beneficiary()).expect("close");
        let highest = auction.highest_bid().expect("bids placed");
        assert_eq!(host.decrypt(highest, beneficiary()), Ok(550));
    }

    #[test]
    fn bidders_cannot_read_the_running_maximum() {
        let (mut host, mut auction) = deploy();
        place_bid(&mut host, &mut auction, "alice", 300);
        place_bid(&mut host, &mut auction, "bob", 550);
        let highest = auction.highest_bid().expect("bids placed");
        assert!(host
            .decrypt(highest, Principal::from_label("alice"))
            .expect_err("denied")
            .is_permission_denied());
        assert!(host
            .decrypt(highest, beneficiary())
            .expect_err("hidden until close")
            .is_permission_denied());
    }

    #[test]
    fn bids_after_close_are_rejected() {
        let (mut host, mut auction) = deploy();
        place_bid(&mut host, &mut auction, "alice", 300);
        auction.close(&mut host, beneficiary()).expect("close");
        let bob = Principal::from_label("bob");
        let input = host
            .create_encrypted_input(auction.address(), bob)
            .add_u64(999)
            .encrypt_one()
            .expect("encrypt");
        let err = auction.bid(&mut host, bob, &input).expect_err("closed");
        assert!(matches!(err, HostError::InvalidArgument { field: "auction", .. }));
    }

    #[test]
    fn closing_without_bids_is_rejected() {
        let (mut host, mut auction) = deploy();
        let err = auction.close(&mut host, beneficiary()).expect_err("no bids");
        assert!(matches!(err, HostError::InvalidArgument { field: "auction", .. }));
    }

    #[test]
    fn only_the_beneficiary_closes() {
        let (mut host, mut auction) = deploy();
        place_bid(&mut host, &mut auction, "alice", 300);
        let err = auction
            .close(&mut host, Principal::from_label("alice"))
            .expect_err("not the beneficiary");
        assert!(matches!(err, HostError::InvalidArgument { field: "caller", .. }));
    }
}
