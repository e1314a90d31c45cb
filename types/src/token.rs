//! Token classes: the independent voting constituencies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::JointerError;

/// One of the four fixed slots of a threshold vector.
///
/// The slot index is part of the wire format of `uint8[4]` majority vectors:
/// `[Primary, SecondaryA, SecondaryB, CrossCommunity]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    /// The main token (JNTR).
    Primary,
    /// First secondary token (ETN).
    SecondaryA,
    /// Second secondary token (STOCK).
    SecondaryB,
    /// Co-voting community from a sibling deployment.
    CrossCommunity,
}

impl TokenClass {
    /// Number of slots in every threshold vector.
    pub const COUNT: usize = 4;

    pub const ALL: [TokenClass; Self::COUNT] = [
        TokenClass::Primary,
        TokenClass::SecondaryA,
        TokenClass::SecondaryB,
        TokenClass::CrossCommunity,
    ];

    pub fn index(&self) -> usize {
        match self {
            Self::Primary => 0,
            Self::SecondaryA => 1,
            Self::SecondaryB => 2,
            Self::CrossCommunity => 3,
        }
    }

    pub fn from_index(index: u64) -> Result<Self, JointerError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i))
            .copied()
            .ok_or(JointerError::InvalidTokenClass(index))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::SecondaryA => "secondary_a",
            Self::SecondaryB => "secondary_b",
            Self::CrossCommunity => "cross_community",
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TokenClass {
    type Err = JointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| JointerError::UnknownTokenClassName(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_slot_order() {
        for (i, class) in TokenClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
            assert_eq!(TokenClass::from_index(i as u64).unwrap(), *class);
        }
        assert!(TokenClass::from_index(4).is_err());
        assert!(TokenClass::from_index(1 << 32).is_err());
        assert!(TokenClass::from_index(u64::MAX).is_err());
    }

    #[test]
    fn names_parse_back() {
        for class in TokenClass::ALL {
            assert_eq!(class.name().parse::<TokenClass>().unwrap(), class);
        }
        assert!("jntr".parse::<TokenClass>().is_err());
    }
}
