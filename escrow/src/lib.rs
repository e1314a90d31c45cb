//! Escrow ledger for the Jointer token system.
//!
//! Holds the pre-allocated supply on behalf of wallets and partitions the
//! escrowed community into groups. A group's rate scales its members' voting
//! weight in the Escrowed governance instance; its restriction caps single
//! withdrawals. Every structural change is a governed call.

pub mod error;
pub mod group;
pub mod ledger;
pub mod ops;
pub mod weights;

pub use error::EscrowError;
pub use group::{Group, DEFAULT_RATE};
pub use ledger::EscrowLedger;
pub use ops::EscrowOp;
pub use weights::{shared, EscrowHoldings, EscrowVotingPower, SharedEscrow};
