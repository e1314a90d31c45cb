//! Nullable infrastructure for deterministic testing.
//!
//! The control plane only ever touches two external things: the wall clock
//! and the token contracts it reads balances from. This crate provides
//! controllable stand-ins for both:
//! - time only moves when a test advances it
//! - balances and supply are set directly, with no transfer bookkeeping
//!
//! Usage: hand these to the engines in place of real sources.

pub mod clock;
pub mod ledger;

pub use clock::NullClock;
pub use ledger::NullTokenLedger;
