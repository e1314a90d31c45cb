//! Governed gateway operations.

use jointer_governance::{Call, CallReturn};
use jointer_types::Address;

use crate::error::GatewayError;
use crate::router::GatewayRouter;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayOp {
    AddChannel { label: String },
    AddWallet { channel: u64, label: String, address: Address },
    SetAdmin { admin: Address },
    SetVotingContract { contract: Address },
    BlockWallet { channel: u64, wallet: u64, blocked: bool },
    BlockChannel { channel: u64, blocked: bool },
    TransferOwnership { owner: Address },
}

impl GatewayOp {
    pub fn decode(call: &Call) -> Result<Self, GatewayError> {
        let op = match call.signature().as_str() {
            "addChannel(string)" => Self::AddChannel {
                label: call.text(0)?.to_string(),
            },
            "addWallet(uint256,string,address)" => Self::AddWallet {
                channel: call.uint64(0)?,
                label: call.text(1)?.to_string(),
                address: call.address(2)?,
            },
            "setAdmin(address)" => Self::SetAdmin {
                admin: call.address(0)?,
            },
            "setVotingContract(address)" => Self::SetVotingContract {
                contract: call.address(0)?,
            },
            "blockWallet(uint256,uint256,bool)" => Self::BlockWallet {
                channel: call.uint64(0)?,
                wallet: call.uint64(1)?,
                blocked: call.boolean(2)?,
            },
            "blockChannel(uint256,bool)" => Self::BlockChannel {
                channel: call.uint64(0)?,
                blocked: call.boolean(1)?,
            },
            "transferOwnership(address)" => Self::TransferOwnership {
                owner: call.address(0)?,
            },
            _ => return Err(call.unknown().into()),
        };
        Ok(op)
    }
}

impl GatewayRouter {
    pub fn invoke(&mut self, caller: &Address, call: &Call) -> Result<CallReturn, GatewayError> {
        if call.target != self.address() {
            return Err(GatewayError::UnknownContract(call.target));
        }
        Ok(match GatewayOp::decode(call)? {
            GatewayOp::AddChannel { label } => CallReturn::Id(self.add_channel(caller, &label)?),
            GatewayOp::AddWallet {
                channel,
                label,
                address,
            } => CallReturn::Id(self.add_wallet(caller, channel, &label, address)?),
            GatewayOp::SetAdmin { admin } => {
                self.set_admin(caller, admin)?;
                CallReturn::Unit
            }
            GatewayOp::SetVotingContract { contract } => {
                self.set_voting_contract(caller, contract)?;
                CallReturn::Unit
            }
            GatewayOp::BlockWallet {
                channel,
                wallet,
                blocked,
            } => {
                self.block_wallet(caller, channel, wallet, blocked)?;
                CallReturn::Unit
            }
            GatewayOp::BlockChannel { channel, blocked } => {
                self.block_channel(caller, channel, blocked)?;
                CallReturn::Unit
            }
            GatewayOp::TransferOwnership { owner } => {
                self.transfer_ownership(caller, owner)?;
                CallReturn::Unit
            }
        })
    }
}
