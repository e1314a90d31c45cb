//! The escrow ledger: pre-allocated supply held on behalf of wallets, and
//! the group partition that decides how much governance weight it carries.
//!
//! Balances and membership are independent. The company allocates balances
//! out of the pre-allocated supply; only `move_to_group` (a governed call)
//! registers a wallet as escrowed, which is what gives its balance weight in
//! the Escrowed governance instance.
//!
//! The company's own balance never leaves through `withdraw`. Treasury
//! outflows are released to the bound gateway, which has already checked
//! the destination channel and wallet.

use std::collections::BTreeMap;

use jointer_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EscrowError;
use crate::group::{Group, DEFAULT_RATE};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscrowLedger {
    address: Address,
    /// Governed writer, normally the Escrowed governance proxy.
    owner: Address,
    company: Address,
    preallocated: Amount,
    initialized: bool,
    /// Router allowed to release company funds.
    gateway: Option<Address>,
    groups: Vec<Group>,
    members: BTreeMap<Address, u64>,
    balances: BTreeMap<Address, Amount>,
}

impl EscrowLedger {
    pub fn new(address: Address, owner: Address, company: Address, preallocated: Amount) -> Self {
        Self {
            address,
            owner,
            company,
            preallocated,
            initialized: false,
            gateway: None,
            groups: vec![Group::new(0, DEFAULT_RATE)],
            members: BTreeMap::new(),
            balances: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn company(&self) -> Address {
        self.company
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn gateway(&self) -> Option<Address> {
        self.gateway
    }

    fn only_owner(&self, caller: &Address) -> Result<(), EscrowError> {
        if *caller == self.owner {
            Ok(())
        } else {
            Err(EscrowError::Unauthorized(*caller))
        }
    }

    fn group_mut(&mut self, id: u64) -> Result<&mut Group, EscrowError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.groups.get_mut(i))
            .ok_or(EscrowError::UnknownGroup(id))
    }

    /// Credit the pre-allocated supply to the company in the default group.
    /// Company only, once.
    pub fn init(&mut self, caller: &Address) -> Result<(), EscrowError> {
        if *caller != self.company {
            return Err(EscrowError::Unauthorized(*caller));
        }
        if self.initialized {
            return Err(EscrowError::AlreadyInitialized);
        }
        self.initialized = true;
        let balance = self.balances.entry(self.company).or_default();
        *balance = balance.saturating_add(self.preallocated);
        self.members.insert(self.company, 0);
        info!(escrow = %self.address, supply = %self.preallocated, "escrow initialized");
        Ok(())
    }

    // ── Groups ───────────────────────────────────────────────────────────

    pub fn add_group(&mut self, caller: &Address, rate: u64) -> Result<u64, EscrowError> {
        self.only_owner(caller)?;
        let id = self.groups.len() as u64;
        self.groups.push(Group::new(id, rate));
        info!(escrow = %self.address, group_id = id, rate, "group added");
        Ok(id)
    }

    pub fn change_group_rate(
        &mut self,
        caller: &Address,
        group_id: u64,
        rate: u64,
    ) -> Result<(), EscrowError> {
        self.only_owner(caller)?;
        self.group_mut(group_id)?.rate = rate;
        info!(escrow = %self.address, group_id, rate, "group rate changed");
        Ok(())
    }

    pub fn set_group_restriction(
        &mut self,
        caller: &Address,
        group_id: u64,
        restriction: Amount,
    ) -> Result<(), EscrowError> {
        self.only_owner(caller)?;
        self.group_mut(group_id)?.restriction = restriction;
        info!(escrow = %self.address, group_id, %restriction, "group restriction set");
        Ok(())
    }

    /// Put `wallet` in `group_id`, replacing any earlier membership.
    pub fn move_to_group(
        &mut self,
        caller: &Address,
        wallet: Address,
        group_id: u64,
    ) -> Result<(), EscrowError> {
        self.only_owner(caller)?;
        self.group(group_id)?;
        let previous = self.members.insert(wallet, group_id);
        info!(escrow = %self.address, %wallet, group_id, ?previous, "wallet moved to group");
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: &Address, owner: Address) -> Result<(), EscrowError> {
        self.only_owner(caller)?;
        self.owner = owner;
        info!(escrow = %self.address, %owner, "escrow ownership transferred");
        Ok(())
    }

    /// Bind the router that may release company funds.
    pub fn bind_gateway(&mut self, caller: &Address, gateway: Address) -> Result<(), EscrowError> {
        self.only_owner(caller)?;
        self.gateway = Some(gateway);
        info!(escrow = %self.address, %gateway, "gateway bound");
        Ok(())
    }

    // ── Balances ─────────────────────────────────────────────────────────

    /// Move `amount` of the company's escrowed supply to `wallet`.
    pub fn allocate(
        &mut self,
        caller: &Address,
        wallet: Address,
        amount: Amount,
    ) -> Result<(), EscrowError> {
        if *caller != self.company {
            return Err(EscrowError::Unauthorized(*caller));
        }
        if !self.initialized {
            return Err(EscrowError::NotInitialized);
        }
        self.debit(self.company, amount)?;
        let balance = self.balances.entry(wallet).or_default();
        *balance = balance.saturating_add(amount);
        debug!(escrow = %self.address, %wallet, %amount, "escrow allocated");
        Ok(())
    }

    /// Release `amount` of the caller's own balance out of escrow, subject to
    /// its group's restriction. The company is refused; its funds leave
    /// through [`EscrowLedger::release`].
    pub fn withdraw(&mut self, caller: &Address, amount: Amount) -> Result<Amount, EscrowError> {
        if *caller == self.company {
            return Err(EscrowError::Unauthorized(*caller));
        }
        self.check_restriction(caller, amount)?;
        let remaining = self.debit(*caller, amount)?;
        info!(escrow = %self.address, wallet = %caller, %amount, %remaining, "escrow withdrawn");
        Ok(remaining)
    }

    /// Release company funds for a routed outflow. Only the bound gateway
    /// may call this.
    pub fn release(&mut self, caller: &Address, amount: Amount) -> Result<Amount, EscrowError> {
        if self.gateway.as_ref() != Some(caller) {
            return Err(EscrowError::Unauthorized(*caller));
        }
        let company = self.company;
        self.check_restriction(&company, amount)?;
        let remaining = self.debit(company, amount)?;
        info!(escrow = %self.address, gateway = %caller, %amount, %remaining, "company funds released");
        Ok(remaining)
    }

    fn check_restriction(&self, wallet: &Address, amount: Amount) -> Result<(), EscrowError> {
        match self.group_of(wallet).and_then(|id| self.group(id).ok()) {
            Some(group) if !group.permits(amount) => Err(EscrowError::RestrictionExceeded {
                wallet: *wallet,
                group: group.id,
                amount,
                limit: group.restriction,
            }),
            _ => Ok(()),
        }
    }

    fn debit(&mut self, wallet: Address, amount: Amount) -> Result<Amount, EscrowError> {
        let available = self.balance_of(&wallet);
        let remaining = available
            .checked_sub(amount)
            .ok_or(EscrowError::InsufficientBalance {
                wallet,
                requested: amount,
                available,
            })?;
        self.balances.insert(wallet, remaining);
        Ok(remaining)
    }

    // ── Views ────────────────────────────────────────────────────────────

    pub fn group(&self, id: u64) -> Result<&Group, EscrowError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.groups.get(i))
            .ok_or(EscrowError::UnknownGroup(id))
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group_of(&self, wallet: &Address) -> Option<u64> {
        self.members.get(wallet).copied()
    }

    pub fn is_escrowed(&self, wallet: &Address) -> bool {
        self.members.contains_key(wallet)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn balance_of(&self, wallet: &Address) -> Amount {
        self.balances.get(wallet).copied().unwrap_or(Amount::ZERO)
    }

    /// Balance of `wallet` if it is a registered member, else zero.
    pub fn member_holdings(&self, wallet: &Address) -> Amount {
        if self.is_escrowed(wallet) {
            self.balance_of(wallet)
        } else {
            Amount::ZERO
        }
    }

    pub fn total_member_holdings(&self) -> Amount {
        self.members.keys().map(|w| self.balance_of(w)).sum()
    }

    /// Escrowed voting weight: balance scaled by the member's group rate.
    pub fn voting_power(&self, wallet: &Address) -> Amount {
        match self.group_of(wallet).and_then(|id| self.group(id).ok()) {
            Some(group) => self.balance_of(wallet).scale_percent(group.rate),
            None => Amount::ZERO,
        }
    }

    pub fn total_voting_power(&self) -> Amount {
        self.members.keys().map(|w| self.voting_power(w)).sum()
    }
}
