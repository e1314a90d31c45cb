//! Where voting weight comes from.

use std::fmt;

use jointer_types::{Address, Amount, SharedLedger, TokenClass};

/// Per-class balances and supplies consumed by the voting engine.
///
/// `None` means the class has no source (token not deployed): its weight is
/// zero and it is skipped when ballots are evaluated.
pub trait WeightSource {
    fn balance_of(&self, class: TokenClass, holder: &Address) -> Option<Amount>;
    fn total_supply(&self, class: TokenClass) -> Option<Amount>;
}

/// Token-ledger backed weights, one slot per class.
///
/// An overlay adds a second ledger's balance to a holder's weight without
/// touching supply. The Global instance overlays escrow holdings on the
/// primary token: pre-minted supply sits in the escrow contract, so it is
/// already counted in total supply but belongs to the escrowed holders.
#[derive(Clone, Default)]
pub struct TokenWeights {
    tokens: [Option<SharedLedger>; TokenClass::COUNT],
    overlays: [Option<SharedLedger>; TokenClass::COUNT],
}

impl TokenWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, class: TokenClass, ledger: SharedLedger) -> Self {
        self.set_token(class, ledger);
        self
    }

    pub fn set_token(&mut self, class: TokenClass, ledger: SharedLedger) {
        self.tokens[class.index()] = Some(ledger);
    }

    pub fn set_overlay(&mut self, class: TokenClass, ledger: SharedLedger) {
        self.overlays[class.index()] = Some(ledger);
    }
}

impl WeightSource for TokenWeights {
    fn balance_of(&self, class: TokenClass, holder: &Address) -> Option<Amount> {
        let base = self.tokens[class.index()].as_ref()?.balance_of(holder);
        let extra = self.overlays[class.index()]
            .as_ref()
            .map(|l| l.balance_of(holder))
            .unwrap_or(Amount::ZERO);
        Some(base.saturating_add(extra))
    }

    fn total_supply(&self, class: TokenClass) -> Option<Amount> {
        self.tokens[class.index()].as_ref().map(|l| l.total_supply())
    }
}

impl fmt::Debug for TokenWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |slots: &[Option<SharedLedger>; TokenClass::COUNT]| {
            TokenClass::ALL
                .iter()
                .filter(|c| slots[c.index()].is_some())
                .map(|c| c.name())
                .collect::<Vec<_>>()
        };
        f.debug_struct("TokenWeights")
            .field("tokens", &bound(&self.tokens))
            .field("overlays", &bound(&self.overlays))
            .finish()
    }
}
