//! Fundamental types for the Jointer governance control plane.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, amounts, timestamps, token classes, and the token-ledger seam
//! through which the external ledger substrate reports balances.

pub mod address;
pub mod amount;
pub mod error;
pub mod ledger;
pub mod time;
pub mod token;

pub use address::Address;
pub use amount::Amount;
pub use error::JointerError;
pub use ledger::{SharedLedger, TokenLedger};
pub use time::Timestamp;
pub use token::TokenClass;
