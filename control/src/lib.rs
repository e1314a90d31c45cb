//! Control plane for the Jointer token system.
//!
//! Wires the Global and Escrowed governance instances, their proxies, the
//! escrow ledger, the gateway router and any external managed contracts into
//! one [`ControlPlane`]. [`deploy`] brings the whole system up from a
//! [`DeploymentConfig`]; afterwards every privileged change flows through a
//! proposal, a vote and proxy execution.

pub mod config;
pub mod contract;
pub mod deploy;
pub mod error;
pub mod instance;
pub mod plane;

pub use config::{DeploymentConfig, ExclusionConfig, InstanceConfig, MajoritySlot, RuleConfig, Tier, WalletConfig};
pub use contract::ExternalContract;
pub use deploy::{deploy, TokenSources};
pub use error::ControlError;
pub use instance::{Instance, InstanceKind};
pub use plane::{AddressBook, ControlPlane, Outflow};

/// Install the configured log subscriber. Returns `false` if one was
/// already installed.
pub fn init_logging(config: &DeploymentConfig) -> bool {
    jointer_utils::init_logging(config.log_format, &config.log_level)
}
