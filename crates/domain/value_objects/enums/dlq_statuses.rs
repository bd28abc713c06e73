use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DlqStatus {
    Pending,
    Retrying,
    Resolved,
    Failed,
}

impl DlqStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DlqStatus::Pending => "pending",
            DlqStatus::Retrying => "retrying",
            DlqStatus::Resolved => "resolved",
            DlqStatus::Failed => "failed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(DlqStatus::Pending),
            "retrying" => Some(DlqStatus::Retrying),
            "resolved" => Some(DlqStatus::Resolved),
            "failed" => Some(DlqStatus::Failed),
            _ => None,
        }
    }
}

impl Display for DlqStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
