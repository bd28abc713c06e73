use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Insurance coverage upgrades a renter can buy. `Premium50` halves the
/// deductible; `Zero` removes it entirely.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CoverageUpgrade {
    Standard,
    Premium50,
    Zero,
}

impl CoverageUpgrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageUpgrade::Standard => "standard",
            CoverageUpgrade::Premium50 => "premium50",
            CoverageUpgrade::Zero => "zero",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "standard" => Some(CoverageUpgrade::Standard),
            "premium50" => Some(CoverageUpgrade::Premium50),
            "zero" => Some(CoverageUpgrade::Zero),
            _ => None,
        }
    }

    pub fn deductible_multiplier(&self) -> f64 {
        match self {
            CoverageUpgrade::Standard => 1.0,
            CoverageUpgrade::Premium50 => 0.5,
            CoverageUpgrade::Zero => 0.0,
        }
    }
}

impl Display for CoverageUpgrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
