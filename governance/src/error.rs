use jointer_types::{Address, JointerError, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("rule {0} not found")]
    UnknownRule(u64),

    #[error("ballot {0} not found")]
    UnknownBallot(u64),

    #[error("invalid voting window: deadline {until} is not after now ({now})")]
    InvalidWindow { until: Timestamp, now: Timestamp },

    #[error("caller {0} is not authorized for this operation")]
    Unauthorized(Address),

    #[error("ballot {0} has not passed")]
    BallotNotPassed(u64),

    #[error("ballot {0} has already been executed")]
    AlreadyExecuted(u64),

    #[error("ballot {0} is closed for voting")]
    BallotClosed(u64),

    #[error("no contract at {0}")]
    UnknownContract(Address),

    #[error("cannot remove {0}: it is the last CEO wallet")]
    LastCeo(Address),

    #[error("call error: {0}")]
    Call(#[from] CallError),

    #[error("{0}")]
    Types(#[from] JointerError),
}

/// Errors from building, encoding, or decoding a governed call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("malformed selector: {0}")]
    MalformedSelector(String),

    #[error("unsupported ABI type `{0}`")]
    UnsupportedType(String),

    #[error("{selector} takes {expected} arguments, got {got}")]
    ArgumentCount {
        selector: String,
        expected: usize,
        got: usize,
    },

    #[error("argument {index} is not a valid `{expected}`")]
    ArgumentType { index: usize, expected: String },

    #[error("contract {target} has no operation `{selector}`")]
    UnknownSelector { target: Address, selector: String },

    #[error("payload encoding failed: {0}")]
    Encoding(String),
}
