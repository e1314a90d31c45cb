//! Rule-based governance for the Jointer token system.
//!
//! Every privileged operation on a governed contract is a rule: a target, an
//! operation selector and a per-class majority threshold. Holders open
//! ballots against rules and vote with their token balances; a ballot passes
//! as soon as one empowered class reaches its threshold (or, for rules shared
//! by several classes, their combined approval reaches the expedited tier).
//! Passed ballots are executed exactly once through the governance proxy.
//!
//! Two instances exist: Global (all token holders) and Escrowed (escrow
//! group members). They share this engine and differ in their weight source.

pub mod ballot;
pub mod call;
pub mod config;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod ops;
pub mod proxy;
pub mod rule;
pub mod threshold;
pub mod weights;

pub use ballot::{Ballot, BallotStatus, ExecutionReceipt, PassReason, VoteRecord};
pub use call::{AbiType, ArgValue, Call, CallReturn, Selector};
pub use config::GovernanceConfig;
pub use engine::{Execution, Governance};
pub use error::{CallError, GovernanceError};
pub use ops::GovernanceOp;
pub use proxy::{GovernanceProxy, Upgrade};
pub use rule::{Rule, RuleRegistry};
pub use threshold::{MajorityLevels, Threshold, ThresholdVector};
pub use weights::{TokenWeights, WeightSource};
