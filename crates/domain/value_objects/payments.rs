use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for `POST /payments/process`. The method string is parsed
/// into `PaymentMethod` before any side effect runs.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingPaymentParams {
    pub booking_id: Uuid,
    pub payment_method: String,
    pub wallet_amount_usd: Option<f64>,
    pub card_amount_usd: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentResult {
    pub booking_id: Uuid,
    pub booking_status: String,
    pub payment_method: String,
    pub intent_id: Option<Uuid>,
    pub redirect_url: Option<String>,
    pub wallet_amount_usd: Option<f64>,
    pub card_amount_usd: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundParams {
    pub booking_id: Uuid,
    pub full: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundResult {
    pub booking_id: Uuid,
    pub amount_usd: f64,
    pub wallet_refund_usd: f64,
    pub card_refund_usd: f64,
    pub provider_refund_id: Option<String>,
}

/// Provider webhook body. `booking_id` is mandatory; a payload without it is
/// rejected before any processing starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhookPayload {
    pub booking_id: Uuid,
    pub provider_payment_id: Option<String>,
    pub status: String,
    pub status_detail: Option<String>,
}

impl PaymentWebhookPayload {
    pub fn is_approved(&self) -> bool {
        matches!(self.status.as_str(), "approved" | "completed")
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.status.as_str(), "rejected" | "failed")
    }
}
