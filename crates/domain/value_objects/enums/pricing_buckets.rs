use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PricingBucket {
    Economy,
    Standard,
    Premium,
    Luxury,
    UltraLuxury,
}

impl PricingBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingBucket::Economy => "economy",
            PricingBucket::Standard => "standard",
            PricingBucket::Premium => "premium",
            PricingBucket::Luxury => "luxury",
            PricingBucket::UltraLuxury => "ultra_luxury",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "economy" => Some(PricingBucket::Economy),
            "standard" => Some(PricingBucket::Standard),
            "premium" => Some(PricingBucket::Premium),
            "luxury" => Some(PricingBucket::Luxury),
            "ultra_luxury" => Some(PricingBucket::UltraLuxury),
            _ => None,
        }
    }

    /// Guarantee hold scaling per bucket.
    pub fn hold_factor(&self) -> f64 {
        match self {
            PricingBucket::Economy => 0.75,
            PricingBucket::Standard => 1.0,
            PricingBucket::Premium => 1.25,
            PricingBucket::Luxury => 1.5,
            PricingBucket::UltraLuxury => 1.75,
        }
    }
}

impl Display for PricingBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
