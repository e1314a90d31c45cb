//! Voter eligibility: per-class supply exclusions and the blocked-wallet list.
//!
//! Exclusion removes an address from a class's supply denominator and zeroes
//! its weight in that class. Blocking zeroes a wallet's weight in every class
//! but leaves supply untouched. The company treasury is typically both.

use std::collections::BTreeSet;

use jointer_types::{Address, TokenClass};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExclusionSet {
    by_class: [BTreeSet<Address>; TokenClass::COUNT],
}

impl ExclusionSet {
    /// Idempotent; returns how many addresses were newly excluded.
    pub fn add(&mut self, class: TokenClass, addresses: &[Address]) -> usize {
        let set = &mut self.by_class[class.index()];
        addresses.iter().filter(|a| set.insert(**a)).count()
    }

    /// Returns how many addresses were actually removed.
    pub fn remove(&mut self, class: TokenClass, addresses: &[Address]) -> usize {
        let set = &mut self.by_class[class.index()];
        addresses.iter().filter(|a| set.remove(*a)).count()
    }

    pub fn contains(&self, class: TokenClass, address: &Address) -> bool {
        self.by_class[class.index()].contains(address)
    }

    pub fn iter(&self, class: TokenClass) -> impl Iterator<Item = &Address> {
        self.by_class[class.index()].iter()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BlockedWallets(BTreeSet<Address>);

impl BlockedWallets {
    /// Toggle; returns whether the flag changed.
    pub fn set(&mut self, wallet: Address, blocked: bool) -> bool {
        if blocked {
            self.0.insert(wallet)
        } else {
            self.0.remove(&wallet)
        }
    }

    pub fn contains(&self, wallet: &Address) -> bool {
        self.0.contains(wallet)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_is_idempotent_and_per_class() {
        let mut set = ExclusionSet::default();
        let company = Address::from_label("company");
        let vault = Address::from_label("vault");
        assert_eq!(set.add(TokenClass::Primary, &[company, vault]), 2);
        assert_eq!(set.add(TokenClass::Primary, &[company]), 0);
        assert!(set.contains(TokenClass::Primary, &company));
        assert!(!set.contains(TokenClass::SecondaryA, &company));
        assert_eq!(set.remove(TokenClass::Primary, &[vault, vault]), 1);
        assert_eq!(set.iter(TokenClass::Primary).count(), 1);
    }

    #[test]
    fn blocking_toggles() {
        let mut blocked = BlockedWallets::default();
        let company = Address::from_label("company");
        assert!(blocked.set(company, true));
        assert!(!blocked.set(company, true));
        assert!(blocked.contains(&company));
        assert!(blocked.set(company, false));
        assert!(blocked.is_empty());
    }
}
