use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CardHoldStatus {
    Active,
    Captured,
    Cancelled,
    Expired,
}

impl CardHoldStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardHoldStatus::Active => "active",
            CardHoldStatus::Captured => "captured",
            CardHoldStatus::Cancelled => "cancelled",
            CardHoldStatus::Expired => "expired",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "active" => Some(CardHoldStatus::Active),
            "captured" => Some(CardHoldStatus::Captured),
            "cancelled" => Some(CardHoldStatus::Cancelled),
            "expired" => Some(CardHoldStatus::Expired),
            _ => None,
        }
    }
}

impl Display for CardHoldStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
