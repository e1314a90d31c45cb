//! Nullable token ledger: balances and supply set directly by the test.

use std::collections::HashMap;

use jointer_types::{Address, Amount, TokenLedger};
use parking_lot::RwLock;

/// An in-memory token ledger.
///
/// Supply is independent of the balances so tests can model holdings that
/// live outside any tracked wallet.
#[derive(Default)]
pub struct NullTokenLedger {
    balances: RwLock<HashMap<Address, u128>>,
    total_supply: RwLock<u128>,
}

impl NullTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, holder: Address, raw: u128) {
        self.balances.write().insert(holder, raw);
    }

    pub fn set_total_supply(&self, raw: u128) {
        *self.total_supply.write() = raw;
    }

    /// Move `raw` units between holders, saturating at zero.
    pub fn transfer(&self, from: &Address, to: Address, raw: u128) {
        let mut balances = self.balances.write();
        let moved = balances.get(from).copied().unwrap_or(0).min(raw);
        if let Some(b) = balances.get_mut(from) {
            *b -= moved;
        }
        *balances.entry(to).or_insert(0) += moved;
    }
}

impl TokenLedger for NullTokenLedger {
    fn balance_of(&self, holder: &Address) -> Amount {
        Amount::new(self.balances.read().get(holder).copied().unwrap_or(0))
    }

    fn total_supply(&self) -> Amount {
        Amount::new(*self.total_supply.read())
    }
}
