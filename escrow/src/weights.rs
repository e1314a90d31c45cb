//! Token-ledger views over a shared escrow, as consumed by governance.

use std::sync::Arc;

use jointer_types::{Address, Amount, TokenLedger};
use parking_lot::RwLock;

use crate::ledger::EscrowLedger;

/// The escrow as shared between its governed writer and its readers.
pub type SharedEscrow = Arc<RwLock<EscrowLedger>>;

pub fn shared(ledger: EscrowLedger) -> SharedEscrow {
    Arc::new(RwLock::new(ledger))
}

/// Rate-weighted member balances. Weight source of the Escrowed instance.
pub struct EscrowVotingPower(pub SharedEscrow);

impl TokenLedger for EscrowVotingPower {
    fn balance_of(&self, holder: &Address) -> Amount {
        self.0.read().voting_power(holder)
    }

    fn total_supply(&self) -> Amount {
        self.0.read().total_voting_power()
    }
}

/// Raw member balances, overlaid on the primary token for the Global instance.
pub struct EscrowHoldings(pub SharedEscrow);

impl TokenLedger for EscrowHoldings {
    fn balance_of(&self, holder: &Address) -> Amount {
        self.0.read().member_holdings(holder)
    }

    fn total_supply(&self) -> Amount {
        self.0.read().total_member_holdings()
    }
}
