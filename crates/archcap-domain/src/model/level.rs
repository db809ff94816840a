//! CapabilityLevel - Position of a capability in the 4-level tree
//!
//! CapabilityLevel is a Value Object. L1 is the root tier, L4 the leaf tier.

use serde::{Deserialize, Serialize};

use super::capability::CapabilityError;

/// Deepest level a capability may sit at
pub const MAX_DEPTH: u8 = 4;

/// The four tiers of the capability hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapabilityLevel {
    L1,
    L2,
    L3,
    L4,
}

impl CapabilityLevel {
    /// Parse a level string ("L1".."L4")
    pub fn parse(value: &str) -> Result<Self, CapabilityError> {
        match value {
            "L1" => Ok(Self::L1),
            "L2" => Ok(Self::L2),
            "L3" => Ok(Self::L3),
            "L4" => Ok(Self::L4),
            other => Err(CapabilityError::InvalidLevel(other.to_string())),
        }
    }

    pub fn from_numeric(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::L1),
            2 => Some(Self::L2),
            3 => Some(Self::L3),
            4 => Some(Self::L4),
            _ => None,
        }
    }

    pub fn numeric_value(&self) -> u8 {
        match self {
            Self::L1 => 1,
            Self::L2 => 2,
            Self::L3 => 3,
            Self::L4 => 4,
        }
    }

    /// Level a direct child of this level sits at
    ///
    /// Returns `None` for L4: leaves cannot have children.
    pub fn child_level(&self) -> Option<Self> {
        Self::from_numeric(self.numeric_value() + 1)
    }

    pub fn is_root(&self) -> bool {
        *self == Self::L1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::L4 => "L4",
        }
    }
}

impl core::fmt::Display for CapabilityLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for CapabilityLevel {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
