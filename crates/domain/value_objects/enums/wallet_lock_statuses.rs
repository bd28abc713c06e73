use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WalletLockStatus {
    Locked,
    Released,
    Error,
}

impl WalletLockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletLockStatus::Locked => "locked",
            WalletLockStatus::Released => "released",
            WalletLockStatus::Error => "error",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "locked" => Some(WalletLockStatus::Locked),
            "released" => Some(WalletLockStatus::Released),
            "error" => Some(WalletLockStatus::Error),
            _ => None,
        }
    }
}

impl Display for WalletLockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
