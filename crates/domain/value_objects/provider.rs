use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payment object as returned by the provider API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPayment {
    pub id: String,
    pub status: String,
    pub status_detail: Option<String>,
    pub external_reference: Option<String>,
    pub transaction_amount: Option<f64>,
    pub date_approved: Option<DateTime<Utc>>,
}

impl ProviderPayment {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }

    pub fn is_rejected(&self) -> bool {
        self.status == "rejected"
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == "cancelled"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub status: String,
    pub paid_amount: f64,
    pub total_amount: f64,
    #[serde(default)]
    pub payments: Vec<ProviderPayment>,
}

impl ProviderOrder {
    pub fn is_fully_paid(&self) -> bool {
        self.paid_amount >= self.total_amount
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPreapproval {
    pub id: String,
    pub status: String,
    pub external_reference: Option<String>,
}

impl ProviderPreapproval {
    pub fn is_authorized(&self) -> bool {
        self.status == "authorized"
    }
}

/// Checkout created for a card (or card portion) charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCheckout {
    pub preference_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHold {
    pub id: String,
    pub amount_ars: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRefund {
    pub id: String,
}
