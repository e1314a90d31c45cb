//! Ballots and their lifecycle.

use std::collections::BTreeMap;

use jointer_types::{Address, Amount, Timestamp, TokenClass};
use serde::{Deserialize, Serialize};

use crate::call::{Call, CallReturn};

/// Why a ballot passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassReason {
    /// This class alone reached its threshold.
    ClassMajority(TokenClass),
    /// The co-voting classes together reached the expedited tier.
    Expedited,
}

/// `Open -> {Passed, Expired}`; both outcomes are terminal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallotStatus {
    Open,
    Passed { at: Timestamp, reason: PassReason },
    Expired { at: Timestamp },
}

/// One voter's current contribution, snapshotted per class when cast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub support: bool,
    pub weights: [Amount; TokenClass::COUNT],
    pub cast_at: Timestamp,
}

/// Proof that a passed ballot's call was forwarded, kept for repeat queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    pub ballot_id: u64,
    pub rule_id: u64,
    pub target: Address,
    pub selector: String,
    pub result: CallReturn,
    pub executed_at: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ballot {
    pub id: u64,
    pub rule_id: u64,
    pub proposer: Address,
    pub call: Call,
    /// Encoded `call`, as submitted.
    pub payload: Vec<u8>,
    pub opened_at: Timestamp,
    pub closes_at: Timestamp,
    pub approve: [Amount; TokenClass::COUNT],
    pub reject: [Amount; TokenClass::COUNT],
    pub votes: BTreeMap<Address, VoteRecord>,
    pub status: BallotStatus,
    pub receipt: Option<ExecutionReceipt>,
}

impl Ballot {
    pub fn is_open(&self) -> bool {
        self.status == BallotStatus::Open
    }

    pub fn is_passed(&self) -> bool {
        matches!(self.status, BallotStatus::Passed { .. })
    }

    pub fn is_executed(&self) -> bool {
        self.receipt.is_some()
    }

    /// Flip an open ballot to `Expired` once its deadline is reached.
    /// Returns whether the transition happened.
    pub(crate) fn expire_if_due(&mut self, now: Timestamp) -> bool {
        if self.is_open() && now >= self.closes_at {
            self.status = BallotStatus::Expired { at: now };
            return true;
        }
        false
    }

    /// Record `voter`'s vote, replacing any earlier one from the same voter.
    pub(crate) fn record_vote(&mut self, voter: Address, record: VoteRecord) {
        if let Some(previous) = self.votes.remove(&voter) {
            let tally = if previous.support {
                &mut self.approve
            } else {
                &mut self.reject
            };
            for (slot, w) in tally.iter_mut().zip(previous.weights) {
                *slot = slot.saturating_sub(w);
            }
        }
        let tally = if record.support {
            &mut self.approve
        } else {
            &mut self.reject
        };
        for (slot, w) in tally.iter_mut().zip(record.weights) {
            *slot = slot.saturating_add(w);
        }
        self.votes.insert(voter, record);
    }
}
