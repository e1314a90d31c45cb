//! Per-instance governance configuration.

use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;
use crate::threshold::{MajorityLevels, DEFAULT_ABSOLUTE_LEVEL, DEFAULT_EXPEDITED_LEVEL};

/// Initial tiers and voting window length of one Governance instance.
///
/// The tiers are only initial values: afterwards they change solely through
/// `setAbsoluteLevel` / `setExpeditedLevel` votes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default = "default_absolute_level")]
    pub absolute_level: u8,

    #[serde(default = "default_expedited_level")]
    pub expedited_level: u8,

    /// How far `update_close_time` pushes the voting deadline past `now`.
    #[serde(default = "default_voting_period_secs")]
    pub voting_period_secs: u64,
}

fn default_absolute_level() -> u8 {
    DEFAULT_ABSOLUTE_LEVEL
}

fn default_expedited_level() -> u8 {
    DEFAULT_EXPEDITED_LEVEL
}

fn default_voting_period_secs() -> u64 {
    7 * 24 * 3600
}

impl GovernanceConfig {
    pub fn levels(&self) -> Result<MajorityLevels, GovernanceError> {
        MajorityLevels::new(self.absolute_level, self.expedited_level)
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            absolute_level: default_absolute_level(),
            expedited_level: default_expedited_level(),
            voting_period_secs: default_voting_period_secs(),
        }
    }
}
