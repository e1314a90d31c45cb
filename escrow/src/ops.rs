//! Governed escrow operations.

use jointer_governance::{Call, CallReturn};
use jointer_types::{Address, Amount};

use crate::error::EscrowError;
use crate::ledger::EscrowLedger;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EscrowOp {
    MoveToGroup { wallet: Address, group_id: u64 },
    AddGroup { rate: u64 },
    ChangeGroupRate { group_id: u64, rate: u64 },
    SetGroupRestriction { group_id: u64, restriction: Amount },
    TransferOwnership { owner: Address },
}

impl EscrowOp {
    pub fn decode(call: &Call) -> Result<Self, EscrowError> {
        let op = match call.signature().as_str() {
            "moveToGroup(address,uint256)" => Self::MoveToGroup {
                wallet: call.address(0)?,
                group_id: call.uint64(1)?,
            },
            "addGroup(uint256)" => Self::AddGroup {
                rate: call.uint64(0)?,
            },
            "changeGroupRate(uint256,uint256)" => Self::ChangeGroupRate {
                group_id: call.uint64(0)?,
                rate: call.uint64(1)?,
            },
            "setGroupRestriction(uint256,uint256)" => Self::SetGroupRestriction {
                group_id: call.uint64(0)?,
                restriction: Amount::new(call.uint(1)?),
            },
            "transferOwnership(address)" => Self::TransferOwnership {
                owner: call.address(0)?,
            },
            _ => return Err(call.unknown().into()),
        };
        Ok(op)
    }
}

impl EscrowLedger {
    pub fn invoke(&mut self, caller: &Address, call: &Call) -> Result<CallReturn, EscrowError> {
        if call.target != self.address() {
            return Err(EscrowError::UnknownContract(call.target));
        }
        Ok(match EscrowOp::decode(call)? {
            EscrowOp::MoveToGroup { wallet, group_id } => {
                self.move_to_group(caller, wallet, group_id)?;
                CallReturn::Unit
            }
            EscrowOp::AddGroup { rate } => CallReturn::Id(self.add_group(caller, rate)?),
            EscrowOp::ChangeGroupRate { group_id, rate } => {
                self.change_group_rate(caller, group_id, rate)?;
                CallReturn::Unit
            }
            EscrowOp::SetGroupRestriction {
                group_id,
                restriction,
            } => {
                self.set_group_restriction(caller, group_id, restriction)?;
                CallReturn::Unit
            }
            EscrowOp::TransferOwnership { owner } => {
                self.transfer_ownership(caller, owner)?;
                CallReturn::Unit
            }
        })
    }
}
