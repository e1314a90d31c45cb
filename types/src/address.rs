//! 20-byte account and contract addresses, rendered as `0x`-prefixed hex.

use blake2::digest::consts::U20;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::JointerError;

type Blake2b160 = Blake2b<U20>;

/// An account or contract address on the ledger substrate.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address. Never a valid voter or destination.
    pub const ZERO: Self = Self([0u8; 20]);

    pub const PREFIX: &'static str = "0x";

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Deterministic contract address for the `nonce`-th deployment by `deployer`.
    ///
    /// Blake2b-160 over `deployer || nonce (big endian)`.
    pub fn contract(deployer: &Address, nonce: u64) -> Self {
        let mut hasher = Blake2b160::new();
        hasher.update(deployer.0);
        hasher.update(nonce.to_be_bytes());
        let mut out = [0u8; 20];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }

    /// Stable address derived from a human-readable label (handy for fixtures).
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Blake2b160::new();
        hasher.update(label.as_bytes());
        let mut out = [0u8; 20];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Parse a `0x`-prefixed (or bare) 40-digit hex string.
    pub fn from_hex(s: &str) -> Result<Self, JointerError> {
        let digits = s.strip_prefix(Self::PREFIX).unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| JointerError::InvalidAddress(s.to_string()))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| JointerError::InvalidAddress(s.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}{})", Self::PREFIX, hex::encode(&self.0[..4]))
    }
}

impl FromStr for Address {
    type Err = JointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
