//! Majority thresholds: per-class approval percentages and the two
//! process-wide tiers rules may reference by name.

use jointer_types::TokenClass;
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// Default absolute-majority tier, in percent.
pub const DEFAULT_ABSOLUTE_LEVEL: u8 = 90;
/// Default expedited tier, in percent.
pub const DEFAULT_EXPEDITED_LEVEL: u8 = 75;

/// One slot of a threshold vector.
///
/// `Absolute` and `Expedited` follow the governance-wide tiers, so a tier
/// change reaches every rule that names it. `Percent` is a literal override
/// that tier changes never touch. `Percent(0)` means the class does not take
/// part in the rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    Absolute,
    Expedited,
    Percent(u8),
}

impl Threshold {
    pub const DISABLED: Self = Self::Percent(0);

    pub fn is_disabled(&self) -> bool {
        *self == Self::DISABLED
    }

    /// Effective percentage under the given tiers.
    pub fn resolve(&self, levels: &MajorityLevels) -> u8 {
        match self {
            Self::Absolute => levels.absolute,
            Self::Expedited => levels.expedited,
            Self::Percent(p) => *p,
        }
    }
}

/// The two governed tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityLevels {
    absolute: u8,
    expedited: u8,
}

impl MajorityLevels {
    /// Both tiers must lie in `1..=100` and the expedited tier may not
    /// exceed the absolute one.
    pub fn new(absolute: u8, expedited: u8) -> Result<Self, GovernanceError> {
        check_level("absolute", absolute)?;
        check_level("expedited", expedited)?;
        if expedited > absolute {
            return Err(GovernanceError::InvalidThreshold(format!(
                "expedited level {expedited}% exceeds absolute level {absolute}%"
            )));
        }
        Ok(Self {
            absolute,
            expedited,
        })
    }

    pub fn absolute(&self) -> u8 {
        self.absolute
    }

    pub fn expedited(&self) -> u8 {
        self.expedited
    }

    pub fn with_absolute(&self, absolute: u8) -> Result<Self, GovernanceError> {
        Self::new(absolute, self.expedited)
    }

    pub fn with_expedited(&self, expedited: u8) -> Result<Self, GovernanceError> {
        Self::new(self.absolute, expedited)
    }
}

impl Default for MajorityLevels {
    fn default() -> Self {
        Self {
            absolute: DEFAULT_ABSOLUTE_LEVEL,
            expedited: DEFAULT_EXPEDITED_LEVEL,
        }
    }
}

fn check_level(name: &str, value: u8) -> Result<(), GovernanceError> {
    if value == 0 || value > 100 {
        return Err(GovernanceError::InvalidThreshold(format!(
            "{name} level must be within 1..=100, got {value}"
        )));
    }
    Ok(())
}

/// Per-class thresholds of a rule, slot order `[Primary, SecondaryA, SecondaryB, CrossCommunity]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdVector([Threshold; TokenClass::COUNT]);

impl ThresholdVector {
    pub fn new(slots: [Threshold; TokenClass::COUNT]) -> Self {
        Self(slots)
    }

    /// Literal percentages, as carried by a `uint8[4]` argument.
    pub fn from_percentages(percentages: [u8; TokenClass::COUNT]) -> Self {
        Self(percentages.map(Threshold::Percent))
    }

    /// Only `class` takes part, at the absolute tier.
    pub fn absolute_for(class: TokenClass) -> Self {
        let mut slots = [Threshold::DISABLED; TokenClass::COUNT];
        slots[class.index()] = Threshold::Absolute;
        Self(slots)
    }

    /// Reject literals above 100% and vectors that empower no class.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        for (class, slot) in TokenClass::ALL.iter().zip(self.0.iter()) {
            if let Threshold::Percent(p) = slot {
                if *p > 100 {
                    return Err(GovernanceError::InvalidThreshold(format!(
                        "{class} threshold {p}% exceeds 100%"
                    )));
                }
            }
        }
        if self.0.iter().all(Threshold::is_disabled) {
            return Err(GovernanceError::InvalidThreshold(
                "no token class is empowered to pass this rule".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get(&self, class: TokenClass) -> Threshold {
        self.0[class.index()]
    }

    pub fn slots(&self) -> &[Threshold; TokenClass::COUNT] {
        &self.0
    }

    pub fn resolve(&self, levels: &MajorityLevels) -> [u8; TokenClass::COUNT] {
        self.0.map(|t| t.resolve(levels))
    }
}
