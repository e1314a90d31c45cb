//! Channels, destination wallets and the routing check.
//!
//! Channels and wallets are append-only tables. Wallet ids are local to
//! their channel. Blocking a channel does not touch its wallets' own flags;
//! the effective block is `channel.blocked || wallet.blocked`, so a wallet
//! added under a blocked channel is unroutable from the start.

use jointer_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::GatewayError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayWallet {
    pub id: u64,
    pub label: String,
    pub address: Address,
    pub blocked: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: u64,
    pub label: String,
    pub blocked: bool,
    pub wallets: Vec<GatewayWallet>,
}

impl Channel {
    pub fn wallet(&self, id: u64) -> Option<&GatewayWallet> {
        usize::try_from(id).ok().and_then(|i| self.wallets.get(i))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayRouter {
    address: Address,
    /// Reconfigures channels and wallets; normally the Escrowed proxy.
    owner: Address,
    /// Operator allowed to push transfers through the router.
    admin: Address,
    /// May toggle block flags in addition to the owner.
    voting_contract: Option<Address>,
    channels: Vec<Channel>,
}

impl GatewayRouter {
    pub fn new(address: Address, owner: Address, admin: Address) -> Self {
        Self {
            address,
            owner,
            admin,
            voting_contract: None,
            channels: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn voting_contract(&self) -> Option<Address> {
        self.voting_contract
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    fn only_owner(&self, caller: &Address) -> Result<(), GatewayError> {
        if *caller == self.owner {
            Ok(())
        } else {
            Err(GatewayError::Unauthorized(*caller))
        }
    }

    fn may_block(&self, caller: &Address) -> Result<(), GatewayError> {
        if self.voting_contract.as_ref() == Some(caller) {
            return Ok(());
        }
        self.only_owner(caller)
    }

    pub fn channel(&self, id: u64) -> Result<&Channel, GatewayError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.channels.get(i))
            .ok_or(GatewayError::UnknownChannel(id))
    }

    fn channel_mut(&mut self, id: u64) -> Result<&mut Channel, GatewayError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.channels.get_mut(i))
            .ok_or(GatewayError::UnknownChannel(id))
    }

    pub fn wallet(&self, channel: u64, wallet: u64) -> Result<&GatewayWallet, GatewayError> {
        self.channel(channel)?
            .wallet(wallet)
            .ok_or(GatewayError::UnknownWallet { channel, wallet })
    }

    // ── Configuration ────────────────────────────────────────────────────

    pub fn add_channel(&mut self, caller: &Address, label: &str) -> Result<u64, GatewayError> {
        self.only_owner(caller)?;
        let id = self.channels.len() as u64;
        self.channels.push(Channel {
            id,
            label: label.to_string(),
            blocked: false,
            wallets: Vec::new(),
        });
        info!(gateway = %self.address, channel_id = id, label, "channel added");
        Ok(id)
    }

    pub fn add_wallet(
        &mut self,
        caller: &Address,
        channel_id: u64,
        label: &str,
        address: Address,
    ) -> Result<u64, GatewayError> {
        self.only_owner(caller)?;
        let gateway = self.address;
        let channel = self.channel_mut(channel_id)?;
        let id = channel.wallets.len() as u64;
        channel.wallets.push(GatewayWallet {
            id,
            label: label.to_string(),
            address,
            blocked: false,
        });
        info!(%gateway, channel_id, wallet_id = id, label, %address, "wallet added");
        Ok(id)
    }

    pub fn block_channel(
        &mut self,
        caller: &Address,
        channel_id: u64,
        blocked: bool,
    ) -> Result<(), GatewayError> {
        self.may_block(caller)?;
        self.channel_mut(channel_id)?.blocked = blocked;
        info!(gateway = %self.address, channel_id, blocked, "channel block flag set");
        Ok(())
    }

    pub fn block_wallet(
        &mut self,
        caller: &Address,
        channel_id: u64,
        wallet_id: u64,
        blocked: bool,
    ) -> Result<(), GatewayError> {
        self.may_block(caller)?;
        self.wallet(channel_id, wallet_id)?;
        let index = wallet_id as usize;
        if let Some(w) = self.channel_mut(channel_id)?.wallets.get_mut(index) {
            w.blocked = blocked;
        }
        info!(gateway = %self.address, channel_id, wallet_id, blocked, "wallet block flag set");
        Ok(())
    }

    pub fn set_admin(&mut self, caller: &Address, admin: Address) -> Result<(), GatewayError> {
        self.only_owner(caller)?;
        self.admin = admin;
        info!(gateway = %self.address, %admin, "gateway admin set");
        Ok(())
    }

    /// `Address::ZERO` clears the voting contract.
    pub fn set_voting_contract(
        &mut self,
        caller: &Address,
        contract: Address,
    ) -> Result<(), GatewayError> {
        self.only_owner(caller)?;
        self.voting_contract = (!contract.is_zero()).then_some(contract);
        info!(gateway = %self.address, %contract, "voting contract set");
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: &Address, owner: Address) -> Result<(), GatewayError> {
        self.only_owner(caller)?;
        self.owner = owner;
        info!(gateway = %self.address, %owner, "gateway ownership transferred");
        Ok(())
    }

    // ── Routing ──────────────────────────────────────────────────────────

    /// Whether a transfer through `channel` to `wallet` may proceed. Unknown
    /// ids never route. Amounts are not limited here.
    pub fn can_route(&self, channel: u64, wallet: u64, _amount: Amount) -> bool {
        match self.channel(channel) {
            Ok(c) => c.wallet(wallet).is_some_and(|w| !(c.blocked || w.blocked)),
            Err(_) => false,
        }
    }

    /// Authorize an outbound transfer and return its destination.
    pub fn route(
        &self,
        caller: &Address,
        channel: u64,
        wallet: u64,
        amount: Amount,
    ) -> Result<Address, GatewayError> {
        if *caller != self.admin {
            return Err(GatewayError::Unauthorized(*caller));
        }
        let destination = self.wallet(channel, wallet)?.address;
        if !self.can_route(channel, wallet, amount) {
            warn!(gateway = %self.address, channel, wallet, %amount, "route blocked");
            return Err(GatewayError::RouteBlocked { channel, wallet });
        }
        info!(gateway = %self.address, channel, wallet, %amount, %destination, "route authorized");
        Ok(destination)
    }
}
