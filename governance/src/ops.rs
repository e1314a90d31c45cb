//! Operations a Governance instance exposes to its own votes.

use jointer_types::{Address, Timestamp, TokenClass};

use crate::call::{Call, CallReturn};
use crate::engine::Governance;
use crate::error::GovernanceError;
use crate::threshold::ThresholdVector;
use crate::weights::WeightSource;

/// A decoded self-call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GovernanceOp {
    SetAbsoluteLevel(u8),
    SetExpeditedLevel(u8),
    ManageBlockedWallet {
        wallet: Address,
        blocked: bool,
    },
    ChangeRuleMajority {
        rule_id: u64,
        thresholds: ThresholdVector,
    },
    ChangeRuleAddress {
        rule_id: u64,
        target: Address,
    },
    AddRule {
        target: Address,
        thresholds: ThresholdVector,
        selector: String,
    },
    AddExcluded {
        class: TokenClass,
        addresses: Vec<Address>,
    },
    RemoveExcluded {
        class: TokenClass,
        addresses: Vec<Address>,
    },
    ManageCeoWallet {
        wallet: Address,
        add: bool,
    },
    UpdateCloseTime,
}

fn level(call: &Call, index: usize) -> Result<u8, GovernanceError> {
    let raw = call.uint(index)?;
    u8::try_from(raw).map_err(|_| {
        GovernanceError::InvalidThreshold(format!("level must be within 1..=100, got {raw}"))
    })
}

fn percentages(call: &Call, index: usize) -> Result<ThresholdVector, GovernanceError> {
    let values = call.uint_array(index)?;
    let mut slots = [0u8; TokenClass::COUNT];
    if values.len() != slots.len() {
        return Err(GovernanceError::InvalidThreshold(format!(
            "expected {} thresholds, got {}",
            slots.len(),
            values.len()
        )));
    }
    for (slot, v) in slots.iter_mut().zip(values) {
        *slot = u8::try_from(*v)
            .map_err(|_| GovernanceError::InvalidThreshold(format!("threshold {v}% exceeds 100%")))?;
    }
    Ok(ThresholdVector::from_percentages(slots))
}

impl GovernanceOp {
    pub fn decode(call: &Call) -> Result<Self, GovernanceError> {
        let op = match call.signature().as_str() {
            "setAbsoluteLevel(uint256)" => Self::SetAbsoluteLevel(level(call, 0)?),
            "setExpeditedLevel(uint256)" => Self::SetExpeditedLevel(level(call, 0)?),
            "manageBlockedWallet(address,bool)" => Self::ManageBlockedWallet {
                wallet: call.address(0)?,
                blocked: call.boolean(1)?,
            },
            "changeRuleMajority(uint256,uint8[4])" => Self::ChangeRuleMajority {
                rule_id: call.uint64(0)?,
                thresholds: percentages(call, 1)?,
            },
            "changeRuleAddress(uint256,address)" => Self::ChangeRuleAddress {
                rule_id: call.uint64(0)?,
                target: call.address(1)?,
            },
            "addRule(address,uint8[4],string)" => Self::AddRule {
                target: call.address(0)?,
                thresholds: percentages(call, 1)?,
                selector: call.text(2)?.to_string(),
            },
            "addExcluded(uint256,address[])" => Self::AddExcluded {
                class: TokenClass::from_index(call.uint64(0)?)?,
                addresses: call.addresses(1)?.to_vec(),
            },
            "removeExcluded(uint256,address[])" => Self::RemoveExcluded {
                class: TokenClass::from_index(call.uint64(0)?)?,
                addresses: call.addresses(1)?.to_vec(),
            },
            "manageCeoWallet(address,bool)" => Self::ManageCeoWallet {
                wallet: call.address(0)?,
                add: call.boolean(1)?,
            },
            "updateCloseTime()" => Self::UpdateCloseTime,
            _ => return Err(call.unknown().into()),
        };
        Ok(op)
    }
}

impl<W: WeightSource> Governance<W> {
    /// Execute a call addressed to this instance on behalf of `caller`.
    pub fn invoke(
        &mut self,
        caller: &Address,
        call: &Call,
        now: Timestamp,
    ) -> Result<CallReturn, GovernanceError> {
        if call.target != self.address() {
            return Err(GovernanceError::UnknownContract(call.target));
        }
        let ret = match GovernanceOp::decode(call)? {
            GovernanceOp::SetAbsoluteLevel(level) => {
                self.set_absolute_level(caller, level)?;
                CallReturn::Unit
            }
            GovernanceOp::SetExpeditedLevel(level) => {
                self.set_expedited_level(caller, level)?;
                CallReturn::Unit
            }
            GovernanceOp::ManageBlockedWallet { wallet, blocked } => {
                self.manage_blocked_wallet(caller, wallet, blocked)?;
                CallReturn::Unit
            }
            GovernanceOp::ChangeRuleMajority {
                rule_id,
                thresholds,
            } => {
                self.change_rule_majority(caller, rule_id, thresholds)?;
                CallReturn::Unit
            }
            GovernanceOp::ChangeRuleAddress { rule_id, target } => {
                self.change_rule_address(caller, rule_id, target)?;
                CallReturn::Unit
            }
            GovernanceOp::AddRule {
                target,
                thresholds,
                selector,
            } => CallReturn::Id(self.add_rule(caller, target, thresholds, &selector)?),
            GovernanceOp::AddExcluded { class, addresses } => {
                self.add_excluded(caller, class, &addresses)?;
                CallReturn::Unit
            }
            GovernanceOp::RemoveExcluded { class, addresses } => {
                self.remove_excluded(caller, class, &addresses)?;
                CallReturn::Unit
            }
            GovernanceOp::ManageCeoWallet { wallet, add } => {
                self.manage_ceo_wallet(caller, wallet, add)?;
                CallReturn::Unit
            }
            GovernanceOp::UpdateCloseTime => {
                self.update_close_time(caller, now)?;
                CallReturn::Unit
            }
        };
        Ok(ret)
    }
}
