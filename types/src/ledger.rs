//! The token-ledger seam.
//!
//! Balance bookkeeping belongs to the ledger substrate. Engines only read
//! through this trait; the substrate (or a test double) implements it.

use std::sync::Arc;

use crate::{Address, Amount};

/// Read-only view of one token's balances.
pub trait TokenLedger: Send + Sync {
    /// Current balance of `holder`.
    fn balance_of(&self, holder: &Address) -> Amount;

    /// Total supply in existence, including excluded treasury holdings.
    fn total_supply(&self) -> Amount;
}

/// A ledger shared between the substrate and the engines reading it.
pub type SharedLedger = Arc<dyn TokenLedger>;
