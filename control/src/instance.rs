//! A governance instance: its proxy plus every implementation deployed
//! behind it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use jointer_governance::{Governance, GovernanceProxy, TokenWeights};
use jointer_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceKind {
    /// All holders of every token class.
    Global,
    /// Escrow group members only.
    Escrowed,
}

impl InstanceKind {
    pub const ALL: [InstanceKind; 2] = [InstanceKind::Global, InstanceKind::Escrowed];
}

impl fmt::Display for InstanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Escrowed => f.write_str("escrowed"),
        }
    }
}

pub struct Instance {
    pub proxy: GovernanceProxy,
    pub implementations: BTreeMap<Address, Governance<TokenWeights>>,
}

impl Instance {
    pub fn new(proxy: GovernanceProxy, implementation: Governance<TokenWeights>) -> Self {
        let mut implementations = BTreeMap::new();
        implementations.insert(implementation.address(), implementation);
        Self {
            proxy,
            implementations,
        }
    }

    /// Whether `address` is this instance's proxy or one of its implementations.
    pub fn owns(&self, address: &Address) -> bool {
        self.proxy.address() == *address || self.implementations.contains_key(address)
    }

    pub fn deployed(&self) -> BTreeSet<Address> {
        self.implementations.keys().copied().collect()
    }

    /// The implementation the proxy currently points at.
    pub fn current(&self) -> Result<&Governance<TokenWeights>, ControlError> {
        let address = self.proxy.implementation();
        self.implementations
            .get(&address)
            .ok_or(ControlError::UnknownContract(address))
    }

    pub fn current_mut(&mut self) -> Result<&mut Governance<TokenWeights>, ControlError> {
        let address = self.proxy.implementation();
        self.implementations
            .get_mut(&address)
            .ok_or(ControlError::UnknownContract(address))
    }
}
