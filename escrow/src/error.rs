use jointer_governance::CallError;
use jointer_types::{Address, Amount};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EscrowError {
    #[error("group {0} not found")]
    UnknownGroup(u64),

    #[error("escrow already initialized")]
    AlreadyInitialized,

    #[error("escrow not initialized")]
    NotInitialized,

    #[error("caller {0} is not authorized for this operation")]
    Unauthorized(Address),

    #[error("wallet {wallet} holds {available}, cannot move {requested}")]
    InsufficientBalance {
        wallet: Address,
        requested: Amount,
        available: Amount,
    },

    #[error("withdrawal of {amount} by {wallet} exceeds group {group} limit of {limit}")]
    RestrictionExceeded {
        wallet: Address,
        group: u64,
        amount: Amount,
        limit: Amount,
    },

    #[error("call addressed to {0}, not this escrow")]
    UnknownContract(Address),

    #[error(transparent)]
    Call(#[from] CallError),
}
