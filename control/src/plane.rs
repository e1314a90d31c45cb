//! The control plane: both governance instances, the escrow, the gateway and
//! any external managed contracts, driven through one entry point.
//!
//! Passed ballots are executed by the instance's proxy. The forwarded call
//! is dispatched on its target address to a contract kind, which decodes the
//! selector into its own typed operation. Unknown addresses and selectors
//! fail closed.

use std::collections::{BTreeMap, BTreeSet};

use jointer_escrow::SharedEscrow;
use jointer_gateway::{GatewayError, GatewayRouter};
use jointer_governance::{
    ArgValue, BallotStatus, Call, CallReturn, ExecutionReceipt, Governance, GovernanceConfig,
    GovernanceProxy, TokenWeights,
};
use jointer_types::{Address, Amount, Timestamp};
use jointer_utils::{format_remaining, StatsCounter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::contract::ExternalContract;
use crate::error::ControlError;
use crate::instance::{Instance, InstanceKind};

const STATS: &[&str] = &[
    "proposals",
    "votes",
    "passes",
    "executions",
    "expirations",
    "routes",
    "routes_blocked",
];

/// Addresses of the contracts a deployment creates, all derived from the
/// authority and a deployment nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    pub global_implementation: Address,
    pub global_proxy: Address,
    pub escrowed_implementation: Address,
    pub escrowed_proxy: Address,
    pub escrow: Address,
    pub gateway: Address,
}

impl AddressBook {
    /// First nonce not used by [`AddressBook::derive`].
    pub const NEXT_NONCE: u64 = 6;

    pub fn derive(authority: &Address) -> Self {
        Self {
            global_implementation: Address::contract(authority, 0),
            global_proxy: Address::contract(authority, 1),
            escrowed_implementation: Address::contract(authority, 2),
            escrowed_proxy: Address::contract(authority, 3),
            escrow: Address::contract(authority, 4),
            gateway: Address::contract(authority, 5),
        }
    }

    pub fn proxy(&self, kind: InstanceKind) -> Address {
        match kind {
            InstanceKind::Global => self.global_proxy,
            InstanceKind::Escrowed => self.escrowed_proxy,
        }
    }

    /// Resolve a configuration target: an alias or a `0x` address.
    pub fn resolve(&self, target: &str) -> Result<Address, ControlError> {
        match target.trim() {
            "global" => Ok(self.global_proxy),
            "escrowed" => Ok(self.escrowed_proxy),
            "escrow" => Ok(self.escrow),
            "gateway" => Ok(self.gateway),
            other => other
                .parse()
                .map_err(|e| ControlError::Config(format!("rule target {other:?}: {e}"))),
        }
    }
}

/// One authorized transfer out of the company's escrow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outflow {
    pub channel: u64,
    pub wallet: u64,
    pub destination: Address,
    pub amount: Amount,
    pub at: Timestamp,
}

pub struct ControlPlane {
    authority: Address,
    book: AddressBook,
    nonce: u64,
    global: Instance,
    escrowed: Instance,
    escrow: SharedEscrow,
    gateway: GatewayRouter,
    externals: BTreeMap<Address, Box<dyn ExternalContract>>,
    outflows: Vec<Outflow>,
    stats: StatsCounter,
}

impl ControlPlane {
    pub(crate) fn assemble(
        authority: Address,
        book: AddressBook,
        global: Instance,
        escrowed: Instance,
        escrow: SharedEscrow,
        gateway: GatewayRouter,
    ) -> Self {
        Self {
            authority,
            book,
            nonce: AddressBook::NEXT_NONCE,
            global,
            escrowed,
            escrow,
            gateway,
            externals: BTreeMap::new(),
            outflows: Vec::new(),
            stats: StatsCounter::new(STATS),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn authority(&self) -> Address {
        self.authority
    }

    pub fn addresses(&self) -> &AddressBook {
        &self.book
    }

    pub fn instance(&self, kind: InstanceKind) -> &Instance {
        match kind {
            InstanceKind::Global => &self.global,
            InstanceKind::Escrowed => &self.escrowed,
        }
    }

    fn instance_mut(&mut self, kind: InstanceKind) -> &mut Instance {
        match kind {
            InstanceKind::Global => &mut self.global,
            InstanceKind::Escrowed => &mut self.escrowed,
        }
    }

    /// The implementation an instance's proxy currently points at.
    pub fn governance(&self, kind: InstanceKind) -> Result<&Governance<TokenWeights>, ControlError> {
        self.instance(kind).current()
    }

    /// Direct access for bootstrap wiring; the engine still enforces its
    /// own authorization on every write.
    pub fn governance_mut(
        &mut self,
        kind: InstanceKind,
    ) -> Result<&mut Governance<TokenWeights>, ControlError> {
        self.instance_mut(kind).current_mut()
    }

    pub fn implementation_mut(
        &mut self,
        kind: InstanceKind,
        address: &Address,
    ) -> Result<&mut Governance<TokenWeights>, ControlError> {
        self.instance_mut(kind)
            .implementations
            .get_mut(address)
            .ok_or(ControlError::UnknownContract(*address))
    }

    pub fn proxy(&self, kind: InstanceKind) -> &GovernanceProxy {
        &self.instance(kind).proxy
    }

    pub fn escrow(&self) -> &SharedEscrow {
        &self.escrow
    }

    pub fn gateway(&self) -> &GatewayRouter {
        &self.gateway
    }

    pub fn outflows(&self) -> &[Outflow] {
        &self.outflows
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    // ── Deployment wiring ────────────────────────────────────────────────

    pub fn register_external(
        &mut self,
        caller: &Address,
        contract: Box<dyn ExternalContract>,
    ) -> Result<Address, ControlError> {
        if *caller != self.authority {
            return Err(ControlError::Unauthorized(*caller));
        }
        let address = contract.address();
        if self.externals.contains_key(&address) || self.is_internal(&address) {
            return Err(ControlError::Config(format!(
                "a contract is already registered at {address}"
            )));
        }
        self.externals.insert(address, contract);
        info!(%address, "external contract registered");
        Ok(address)
    }

    fn is_internal(&self, address: &Address) -> bool {
        self.global.owns(address)
            || self.escrowed.owns(address)
            || *address == self.book.escrow
            || *address == self.book.gateway
    }

    /// Deploy a fresh implementation behind `kind`'s proxy without switching
    /// to it. It inherits the current weight sources and starts unsealed so
    /// the authority can install its rules before a vote upgrades to it.
    pub fn deploy_implementation(
        &mut self,
        kind: InstanceKind,
        caller: &Address,
        config: &GovernanceConfig,
    ) -> Result<Address, ControlError> {
        if *caller != self.authority {
            return Err(ControlError::Unauthorized(*caller));
        }
        let address = Address::contract(&self.authority, self.nonce);
        let authority = self.authority;
        let instance = self.instance_mut(kind);
        let current = instance.current()?;
        let ceo = current
            .ceo_wallets()
            .next()
            .copied()
            .unwrap_or(authority);
        let overseer = current.overseer();
        let mut implementation =
            Governance::new(address, authority, ceo, config, current.weights().clone())?;
        implementation.set_governance_proxy(&authority, instance.proxy.address())?;
        if let Some(overseer) = overseer {
            implementation.set_overseer(&authority, overseer)?;
        }
        instance.implementations.insert(address, implementation);
        self.nonce += 1;
        info!(instance = %kind, %address, "implementation deployed");
        Ok(address)
    }

    /// Upgrade outside of a vote, by the proxy admin.
    pub fn upgrade(
        &mut self,
        kind: InstanceKind,
        caller: &Address,
        implementation: Address,
        now: Timestamp,
    ) -> Result<(), ControlError> {
        let instance = self.instance_mut(kind);
        let deployed = instance.deployed();
        instance
            .proxy
            .upgrade_to(caller, implementation, |a| deployed.contains(a), now)?;
        Ok(())
    }

    pub fn renounce_admin(&mut self, kind: InstanceKind, caller: &Address) -> Result<(), ControlError> {
        self.instance_mut(kind).proxy.renounce_admin(caller)?;
        Ok(())
    }

    /// Close the bootstrap window of both current implementations.
    pub fn seal(&mut self, caller: &Address) -> Result<(), ControlError> {
        for kind in InstanceKind::ALL {
            let governance = self.governance_mut(kind)?;
            if !governance.is_sealed() {
                governance.seal(caller)?;
            }
        }
        Ok(())
    }

    /// Give the escrow and the gateway to the Escrowed proxy. From then on
    /// they change only through Escrowed ballots.
    pub fn hand_over(&mut self, caller: &Address) -> Result<(), ControlError> {
        if *caller != self.authority {
            return Err(ControlError::Unauthorized(*caller));
        }
        if self.escrow.read().owner() != *caller || self.gateway.owner() != *caller {
            return Err(ControlError::Unauthorized(*caller));
        }
        let proxy = self.book.escrowed_proxy;
        self.escrow.write().transfer_ownership(caller, proxy)?;
        self.gateway.transfer_ownership(caller, proxy)?;
        info!(owner = %proxy, "escrow and gateway handed over");
        Ok(())
    }

    // ── Voting ───────────────────────────────────────────────────────────

    pub fn update_close_time(
        &mut self,
        kind: InstanceKind,
        caller: &Address,
        now: Timestamp,
    ) -> Result<Timestamp, ControlError> {
        Ok(self.governance_mut(kind)?.update_close_time(caller, now)?)
    }

    pub fn propose(
        &mut self,
        kind: InstanceKind,
        proposer: Address,
        rule_id: u64,
        args: Vec<ArgValue>,
        now: Timestamp,
    ) -> Result<u64, ControlError> {
        let governance = self.governance_mut(kind)?;
        let id = governance.propose(proposer, rule_id, args, now)?;
        let closes_at = governance.ballot(id)?.closes_at;
        self.stats.increment("proposals");
        debug!(
            instance = %kind,
            ballot_id = id,
            closes_in = %format_remaining(now, closes_at),
            "proposal submitted"
        );
        Ok(id)
    }

    /// Propose with JSON positional arguments, typed by the rule's selector.
    pub fn propose_json(
        &mut self,
        kind: InstanceKind,
        proposer: Address,
        rule_id: u64,
        args: &[serde_json::Value],
        now: Timestamp,
    ) -> Result<u64, ControlError> {
        let rule = self.governance(kind)?.rule(rule_id)?;
        let call = Call::from_json(rule.target, rule.selector.clone(), args)?;
        self.propose(kind, proposer, rule_id, call.args, now)
    }

    pub fn cast_vote(
        &mut self,
        kind: InstanceKind,
        ballot_id: u64,
        voter: Address,
        support: bool,
        now: Timestamp,
    ) -> Result<BallotStatus, ControlError> {
        let status = self
            .governance_mut(kind)?
            .cast_vote(ballot_id, voter, support, now)?;
        self.stats.increment("votes");
        if matches!(status, BallotStatus::Passed { .. }) {
            self.stats.increment("passes");
        }
        Ok(status)
    }

    /// Expire every due ballot of both instances.
    pub fn expire_due(&mut self, now: Timestamp) -> Result<Vec<(InstanceKind, u64)>, ControlError> {
        let mut expired = Vec::new();
        for kind in InstanceKind::ALL {
            for id in self.governance_mut(kind)?.expire_due(now) {
                self.stats.increment("expirations");
                expired.push((kind, id));
            }
        }
        Ok(expired)
    }

    /// Forward a passed ballot's call through the instance's proxy. Repeat
    /// calls return the stored receipt.
    pub fn execute_if_passed(
        &mut self,
        kind: InstanceKind,
        ballot_id: u64,
        now: Timestamp,
    ) -> Result<ExecutionReceipt, ControlError> {
        let (own, peer) = match kind {
            InstanceKind::Global => (&mut self.global, &mut self.escrowed),
            InstanceKind::Escrowed => (&mut self.escrowed, &mut self.global),
        };
        let mut targets = Targets {
            peer,
            escrow: &self.escrow,
            gateway: &mut self.gateway,
            externals: &mut self.externals,
        };

        let deployed = own.deployed();
        let Instance {
            proxy,
            implementations,
        } = own;
        let current = proxy.implementation();
        let governance = implementations
            .get_mut(&current)
            .ok_or(ControlError::UnknownContract(current))?;
        let executed_before = governance.ballot(ballot_id)?.is_executed();

        let forwarder = proxy.clone();
        let receipt = forwarder.forward(governance, ballot_id, now, |gov, sender, call| {
            targets.dispatch(gov, proxy, &deployed, sender, call, now)
        })?;
        if !executed_before {
            self.stats.increment("executions");
        }
        Ok(receipt)
    }

    // ── Escrow and funds ─────────────────────────────────────────────────

    pub fn init_escrow(&mut self, caller: &Address) -> Result<(), ControlError> {
        Ok(self.escrow.write().init(caller)?)
    }

    pub fn allocate(
        &mut self,
        caller: &Address,
        wallet: Address,
        amount: Amount,
    ) -> Result<(), ControlError> {
        Ok(self.escrow.write().allocate(caller, wallet, amount)?)
    }

    /// A member's own withdrawal. Company funds go through [`Self::route_funds`].
    pub fn withdraw(&mut self, caller: &Address, amount: Amount) -> Result<Amount, ControlError> {
        Ok(self.escrow.write().withdraw(caller, amount)?)
    }

    /// Send company funds out through a gateway channel and wallet.
    ///
    /// The gateway check runs first; the escrow is only debited once the
    /// route is authorized.
    pub fn route_funds(
        &mut self,
        caller: &Address,
        channel: u64,
        wallet: u64,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Outflow, ControlError> {
        let destination = match self.gateway.route(caller, channel, wallet, amount) {
            Ok(destination) => destination,
            Err(e) => {
                if matches!(e, GatewayError::RouteBlocked { .. }) {
                    self.stats.increment("routes_blocked");
                }
                return Err(e.into());
            }
        };
        self.escrow.write().release(&self.gateway.address(), amount)?;

        let outflow = Outflow {
            channel,
            wallet,
            destination,
            amount,
            at: now,
        };
        self.outflows.push(outflow.clone());
        self.stats.increment("routes");
        info!(channel, wallet, %destination, %amount, "funds routed");
        Ok(outflow)
    }
}

/// Everything a forwarded call may reach besides the forwarding instance.
struct Targets<'a> {
    peer: &'a mut Instance,
    escrow: &'a SharedEscrow,
    gateway: &'a mut GatewayRouter,
    externals: &'a mut BTreeMap<Address, Box<dyn ExternalContract>>,
}

impl Targets<'_> {
    fn dispatch(
        &mut self,
        own: &mut Governance<TokenWeights>,
        own_proxy: &mut GovernanceProxy,
        own_deployed: &BTreeSet<Address>,
        sender: &Address,
        call: &Call,
        now: Timestamp,
    ) -> Result<CallReturn, ControlError> {
        let target = call.target;
        if target == own_proxy.address() || target == own.address() {
            return invoke_governance(own, own_proxy, own_deployed, sender, call, now);
        }

        let peer_proxy = self.peer.proxy.address();
        if target == peer_proxy || target == self.peer.proxy.implementation() {
            let deployed = self.peer.deployed();
            let Instance {
                proxy,
                implementations,
            } = &mut *self.peer;
            let current = proxy.implementation();
            let governance = implementations
                .get_mut(&current)
                .ok_or(ControlError::UnknownContract(current))?;
            return invoke_governance(governance, proxy, &deployed, sender, call, now);
        }

        let escrow_address = self.escrow.read().address();
        if target == escrow_address {
            return Ok(self.escrow.write().invoke(sender, call)?);
        }
        if target == self.gateway.address() {
            return Ok(self.gateway.invoke(sender, call)?);
        }
        if let Some(contract) = self.externals.get_mut(&target) {
            return contract.invoke(sender, call, now);
        }
        warn!(%target, selector = %call.signature(), "call to unknown contract");
        Err(ControlError::UnknownContract(target))
    }
}

/// Calls on a governance instance: `upgradeTo` lands on the proxy, anything
/// else on the current implementation.
fn invoke_governance(
    governance: &mut Governance<TokenWeights>,
    proxy: &mut GovernanceProxy,
    deployed: &BTreeSet<Address>,
    sender: &Address,
    call: &Call,
    now: Timestamp,
) -> Result<CallReturn, ControlError> {
    if call.target == proxy.address() && call.signature() == "upgradeTo(address)" {
        return Ok(proxy.invoke(sender, call, |a| deployed.contains(a), now)?);
    }
    let call = Call {
        target: governance.address(),
        selector: call.selector.clone(),
        args: call.args.clone(),
    };
    Ok(governance.invoke(sender, &call, now)?)
}
