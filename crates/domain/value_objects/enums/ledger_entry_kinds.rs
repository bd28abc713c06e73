use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LedgerEntryKind {
    Deposit,
    Withdrawal,
    Charge,
    Refund,
    ProtectedCredit,
}

impl LedgerEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryKind::Deposit => "deposit",
            LedgerEntryKind::Withdrawal => "withdrawal",
            LedgerEntryKind::Charge => "charge",
            LedgerEntryKind::Refund => "refund",
            LedgerEntryKind::ProtectedCredit => "protected_credit",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "deposit" => Some(LedgerEntryKind::Deposit),
            "withdrawal" => Some(LedgerEntryKind::Withdrawal),
            "charge" => Some(LedgerEntryKind::Charge),
            "refund" => Some(LedgerEntryKind::Refund),
            "protected_credit" => Some(LedgerEntryKind::ProtectedCredit),
            _ => None,
        }
    }
}

impl Display for LedgerEntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
