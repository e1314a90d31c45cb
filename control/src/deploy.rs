//! Bring-up of a complete control plane from a [`DeploymentConfig`].
//!
//! Deployment leaves both instances in their bootstrap window so the
//! authority can still adjust them; the first proposal (or an explicit
//! [`ControlPlane::seal`]) closes it. The escrow and the gateway stay owned
//! by the authority until [`ControlPlane::hand_over`] gives them to the
//! Escrowed proxy, so initial groups and members can be set up directly.

use std::sync::Arc;

use jointer_escrow::{shared, EscrowHoldings, EscrowLedger, EscrowVotingPower};
use jointer_gateway::GatewayRouter;
use jointer_governance::{Governance, GovernanceProxy, ThresholdVector, TokenWeights};
use jointer_types::{Address, SharedLedger, Timestamp, TokenClass};
use tracing::info;

use crate::config::DeploymentConfig;
use crate::error::ControlError;
use crate::instance::{Instance, InstanceKind};
use crate::plane::{AddressBook, ControlPlane};

const ESCROW_SELECTORS: &[&str] = &[
    "moveToGroup(address,uint256)",
    "addGroup(uint256)",
    "changeGroupRate(uint256,uint256)",
    "setGroupRestriction(uint256,uint256)",
];

const GATEWAY_SELECTORS: &[&str] = &[
    "addChannel(string)",
    "addWallet(uint256,string,address)",
    "setAdmin(address)",
    "blockWallet(uint256,uint256,bool)",
    "blockChannel(uint256,bool)",
];

const PARAMETER_SELECTORS: &[&str] = &[
    "setAbsoluteLevel(uint256)",
    "setExpeditedLevel(uint256)",
    "manageBlockedWallet(address,bool)",
    "changeRuleMajority(uint256,uint8[4])",
    "changeRuleAddress(uint256,address)",
];

const UPGRADE_SELECTOR: &str = "upgradeTo(address)";

/// External token ledgers, one optional slot per class.
#[derive(Clone, Default)]
pub struct TokenSources([Option<SharedLedger>; TokenClass::COUNT]);

impl TokenSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, class: TokenClass, ledger: SharedLedger) -> Self {
        self.0[class.index()] = Some(ledger);
        self
    }

    pub fn get(&self, class: TokenClass) -> Option<&SharedLedger> {
        self.0[class.index()].as_ref()
    }
}

/// Deploy both governance instances, their proxies, the escrow and the
/// gateway, and open the voting window at `now`.
pub fn deploy(
    config: &DeploymentConfig,
    tokens: TokenSources,
    now: Timestamp,
) -> Result<ControlPlane, ControlError> {
    config.validate()?;
    let authority = config.authority;
    let book = AddressBook::derive(&authority);

    let escrow = shared(EscrowLedger::new(
        book.escrow,
        authority,
        config.company,
        config.escrow_preallocated,
    ));
    escrow.write().bind_gateway(&authority, book.gateway)?;

    // Global: every token class, with escrow holdings counted as primary.
    let mut global = Governance::new(
        book.global_implementation,
        authority,
        config.ceo,
        &config.global.governance,
        TokenWeights::new(),
    )?;
    for class in TokenClass::ALL {
        if let Some(ledger) = tokens.get(class) {
            global.set_token_source(&authority, class, ledger.clone())?;
        }
    }
    global.set_escrow_source(
        &authority,
        TokenClass::Primary,
        Arc::new(EscrowHoldings(escrow.clone())),
    )?;
    global.set_governance_proxy(&authority, book.global_proxy)?;

    // Escrowed: group-weighted escrow balances only.
    let mut escrowed = Governance::new(
        book.escrowed_implementation,
        authority,
        config.ceo,
        &config.escrowed.governance,
        TokenWeights::new(),
    )?;
    escrowed.set_token_source(
        &authority,
        TokenClass::Primary,
        Arc::new(EscrowVotingPower(escrow.clone())),
    )?;
    escrowed.set_governance_proxy(&authority, book.escrowed_proxy)?;
    escrowed.set_overseer(&authority, book.global_proxy)?;

    for (kind, governance) in [
        (InstanceKind::Global, &mut global),
        (InstanceKind::Escrowed, &mut escrowed),
    ] {
        apply_eligibility(governance, config, kind)?;
        governance.update_close_time(&authority, now)?;
    }

    install_default_rules(&mut global, &mut escrowed, &authority, &book)?;
    for rule in &config.rules {
        let target = book.resolve(&rule.target)?;
        let governance = match rule.instance {
            InstanceKind::Global => &mut global,
            InstanceKind::Escrowed => &mut escrowed,
        };
        governance.add_rule(&authority, target, rule.thresholds(), &rule.selector)?;
    }

    let gateway = build_gateway(config, &book)?;

    let plane = ControlPlane::assemble(
        authority,
        book,
        Instance::new(
            GovernanceProxy::new(book.global_proxy, book.global_implementation, authority),
            global,
        ),
        Instance::new(
            GovernanceProxy::new(book.escrowed_proxy, book.escrowed_implementation, authority),
            escrowed,
        ),
        escrow,
        gateway,
    );
    info!(
        %authority,
        global = %book.global_proxy,
        escrowed = %book.escrowed_proxy,
        escrow = %book.escrow,
        gateway = %book.gateway,
        "control plane deployed"
    );
    Ok(plane)
}

/// The company is excluded from primary supply and barred from voting in
/// both instances, on top of the configured lists.
fn apply_eligibility(
    governance: &mut Governance<TokenWeights>,
    config: &DeploymentConfig,
    kind: InstanceKind,
) -> Result<(), ControlError> {
    let authority = config.authority;
    let instance = config.instance(kind);
    governance.add_excluded(&authority, TokenClass::Primary, &[config.company])?;
    for exclusion in &instance.excluded {
        governance.add_excluded(&authority, exclusion.class, &exclusion.addresses)?;
    }
    governance.manage_blocked_wallet(&authority, config.company, true)?;
    for wallet in &instance.blocked {
        governance.manage_blocked_wallet(&authority, *wallet, true)?;
    }
    Ok(())
}

fn install_default_rules(
    global: &mut Governance<TokenWeights>,
    escrowed: &mut Governance<TokenWeights>,
    authority: &Address,
    book: &AddressBook,
) -> Result<(), ControlError> {
    let primary = ThresholdVector::absolute_for(TokenClass::Primary);

    for selector in ESCROW_SELECTORS {
        escrowed.add_rule(authority, book.escrow, primary, selector)?;
    }
    for selector in GATEWAY_SELECTORS {
        escrowed.add_rule(authority, book.gateway, primary, selector)?;
    }
    escrowed.add_rule(authority, book.escrowed_proxy, primary, UPGRADE_SELECTOR)?;

    for target in [book.global_proxy, book.escrowed_proxy] {
        for selector in PARAMETER_SELECTORS {
            global.add_rule(authority, target, primary, selector)?;
        }
    }
    global.add_rule(authority, book.global_proxy, primary, UPGRADE_SELECTOR)?;
    Ok(())
}

fn build_gateway(
    config: &DeploymentConfig,
    book: &AddressBook,
) -> Result<GatewayRouter, ControlError> {
    let authority = config.authority;
    let mut gateway = GatewayRouter::new(book.gateway, authority, config.gateway_admin);
    for label in &config.channels {
        gateway.add_channel(&authority, label)?;
    }
    for wallet in &config.wallets {
        gateway.add_wallet(&authority, wallet.channel, &wallet.label, wallet.address)?;
    }
    Ok(gateway)
}
