//! Escrow groups.

use jointer_types::Amount;
use serde::{Deserialize, Serialize};

/// Rate of the default group: 100 means balances count at face value.
pub const DEFAULT_RATE: u64 = 100;

/// A rate- and restriction-bearing partition of escrowed wallets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    /// Voting-weight multiplier in percent.
    pub rate: u64,
    /// Largest single withdrawal a member may make. Zero means no limit.
    pub restriction: Amount,
}

impl Group {
    pub fn new(id: u64, rate: u64) -> Self {
        Self {
            id,
            rate,
            restriction: Amount::ZERO,
        }
    }

    pub fn is_restricted(&self) -> bool {
        !self.restriction.is_zero()
    }

    /// Whether a withdrawal of `amount` stays within the restriction.
    pub fn permits(&self, amount: Amount) -> bool {
        !self.is_restricted() || amount <= self.restriction
    }
}
