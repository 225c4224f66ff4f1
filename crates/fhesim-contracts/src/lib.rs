//! # fhesim-contracts
//!
//! A corpus of minimal example contracts over the [`fhesim_core`] host,
//! each a few dozen lines, illustrating correct — and deliberately
//! incorrect — usage of the encrypted-handle lifecycle: input proofs,
//! contract self-grants, user decrypt grants, and the
//! derive-then-re-grant discipline.
//!
//! | Contract | Pattern it teaches |
//! |----------|--------------------|
//! | [`counter::Counter`] | The canonical admit / self-grant / derive / re-grant flow |
//! | [`counter::ForgetfulCounter`] | What breaks when result grants are omitted |
//! | [`adder::Adder`] | Per-submitter input proofs across parties |
//! | [`calculator::Calculator`] | Scalar operators and divisor validation |
//! | [`comparator::Comparator`] | Compare-then-select without revealing the comparison |
//! | [`ballot::BallotBox`] | Private aggregation with deferred reveal |
//! | [`token::ConfidentialToken`] | Select-guarded transfers over encrypted balances |
//! | [`auction::SealedBidAuction`] | Encrypted running maximum with a single reveal |
//! | [`shared_vault::SharedVault`] | Revocable user decrypt grants |
//!
//! Contracts are plain structs; entry points take the host, the calling
//! principal, and opaque handle + proof inputs, mirroring how on-chain
//! entry points receive them.

pub mod adder;
pub mod auction;
pub mod ballot;
pub mod calculator;
pub mod comparator;
pub mod counter;
pub mod shared_vault;
pub mod token;

pub use adder::Adder;
pub use auction::SealedBidAuction;
pub use ballot::BallotBox;
pub use calculator::Calculator;
pub use comparator::Comparator;
pub use counter::{Counter, ForgetfulCounter};
pub use shared_vault::SharedVault;
pub use token::ConfidentialToken;
