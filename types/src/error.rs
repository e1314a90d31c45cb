//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for parsing and validating shared primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JointerError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid token class index: {0}")]
    InvalidTokenClass(u64),

    #[error("invalid token class name: {0}")]
    UnknownTokenClassName(String),
}
