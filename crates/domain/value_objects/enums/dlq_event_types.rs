use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DlqEventType {
    Payment,
    MerchantOrder,
    Preapproval,
}

impl DlqEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DlqEventType::Payment => "payment",
            DlqEventType::MerchantOrder => "merchant_order",
            DlqEventType::Preapproval => "preapproval",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "payment" => Some(DlqEventType::Payment),
            "merchant_order" => Some(DlqEventType::MerchantOrder),
            "preapproval" => Some(DlqEventType::Preapproval),
            _ => None,
        }
    }
}

impl Display for DlqEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
