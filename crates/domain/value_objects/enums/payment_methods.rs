use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    Wallet,
    Card,
    PartialWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Card => "card",
            PaymentMethod::PartialWallet => "partial_wallet",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "wallet" => Some(PaymentMethod::Wallet),
            "card" => Some(PaymentMethod::Card),
            "partial_wallet" => Some(PaymentMethod::PartialWallet),
            _ => None,
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
