//! Gateway router: the single chokepoint for outbound transfers.
//!
//! Governance configures channels (e.g. "Gateway supply", "Crypto
//! exchanges") and destination wallets under them; the admin operator routes
//! transfers, which succeed only while neither the channel nor the wallet is
//! blocked.

pub mod error;
pub mod ops;
pub mod router;

pub use error::GatewayError;
pub use ops::GatewayOp;
pub use router::{Channel, GatewayRouter, GatewayWallet};
