use jointer_escrow::EscrowError;
use jointer_gateway::GatewayError;
use jointer_governance::{CallError, GovernanceError};
use jointer_types::Address;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("governance: {0}")]
    Governance(#[from] GovernanceError),

    #[error("escrow: {0}")]
    Escrow(#[from] EscrowError),

    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),

    #[error("call: {0}")]
    Call(#[from] CallError),

    #[error("no contract deployed at {0}")]
    UnknownContract(Address),

    #[error("caller {0} is not authorized for this operation")]
    Unauthorized(Address),

    #[error("contract {target} rejected the call: {reason}")]
    External { target: Address, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}
