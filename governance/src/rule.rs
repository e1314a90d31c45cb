//! The rule registry: which (target, operation) pairs are governable and
//! what majority each token class must reach to pass them.

use jointer_types::Address;
use serde::{Deserialize, Serialize};

use crate::call::Selector;
use crate::error::GovernanceError;
use crate::threshold::ThresholdVector;

/// A governable operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Assigned at insertion, doubles as the index into the registry.
    pub id: u64,
    pub target: Address,
    pub selector: Selector,
    pub thresholds: ThresholdVector,
}

/// Append-only, never reordered. Rules are amended in place, never removed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        target: Address,
        thresholds: ThresholdVector,
        selector: &str,
    ) -> Result<u64, GovernanceError> {
        thresholds.validate()?;
        let selector = Selector::parse(selector)?;
        let id = self.rules.len() as u64;
        self.rules.push(Rule {
            id,
            target,
            selector,
            thresholds,
        });
        Ok(id)
    }

    pub fn get(&self, id: u64) -> Result<&Rule, GovernanceError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.rules.get(i))
            .ok_or(GovernanceError::UnknownRule(id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Rule, GovernanceError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.rules.get_mut(i))
            .ok_or(GovernanceError::UnknownRule(id))
    }

    pub fn change_majority(
        &mut self,
        id: u64,
        thresholds: ThresholdVector,
    ) -> Result<(), GovernanceError> {
        let rule = self.get_mut(id)?;
        thresholds.validate()?;
        rule.thresholds = thresholds;
        Ok(())
    }

    pub fn change_address(&mut self, id: u64, target: Address) -> Result<(), GovernanceError> {
        self.get_mut(id)?.target = target;
        Ok(())
    }

    /// First rule governing `signature` on `target`.
    pub fn find(&self, target: &Address, signature: &str) -> Option<&Rule> {
        let wanted = Selector::parse(signature).ok()?;
        self.rules
            .iter()
            .find(|r| &r.target == target && r.selector == wanted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
