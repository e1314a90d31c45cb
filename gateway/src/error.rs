use jointer_governance::CallError;
use jointer_types::Address;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("channel {0} not found")]
    UnknownChannel(u64),

    #[error("wallet {wallet} not found in channel {channel}")]
    UnknownWallet { channel: u64, wallet: u64 },

    #[error("caller {0} is not authorized for this operation")]
    Unauthorized(Address),

    #[error("route through channel {channel} to wallet {wallet} is blocked")]
    RouteBlocked { channel: u64, wallet: u64 },

    #[error("call addressed to {0}, not this gateway")]
    UnknownContract(Address),

    #[error(transparent)]
    Call(#[from] CallError),
}
