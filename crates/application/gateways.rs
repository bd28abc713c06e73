use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::{
    alerts::AlertPayload,
    provider::{
        ProviderCheckout, ProviderHold, ProviderOrder, ProviderPayment, ProviderPreapproval,
        ProviderRefund,
    },
};

/// Everything the payment provider does for us. Implemented by the
/// MercadoPago client in infra; mocked in usecase tests.
#[async_trait]
#[automock]
pub trait PaymentProviderGateway {
    /// Creates a checkout the renter is redirected to for a card charge.
    /// The booking id travels as the external reference.
    async fn create_checkout(
        &self,
        booking_id: Uuid,
        amount_ars: f64,
        description: &str,
    ) -> Result<ProviderCheckout>;

    async fn get_payment(&self, provider_payment_id: &str) -> Result<ProviderPayment>;

    async fn search_payments_by_booking_id(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<ProviderPayment>>;

    async fn get_merchant_order(&self, order_id: &str) -> Result<ProviderOrder>;

    async fn get_preapproval(&self, preapproval_id: &str) -> Result<ProviderPreapproval>;

    /// Places a card pre-authorization (capture deferred).
    async fn create_hold(&self, booking_id: Uuid, amount_ars: f64) -> Result<ProviderHold>;

    async fn capture_hold(&self, provider_hold_id: &str) -> Result<()>;

    async fn cancel_hold(&self, provider_hold_id: &str) -> Result<()>;

    async fn refund_payment(
        &self,
        provider_payment_id: &str,
        amount_ars: Option<f64>,
    ) -> Result<ProviderRefund>;

    /// Verifies the `x-signature` header (ts/v1 HMAC-SHA256) of a webhook
    /// delivery against the raw body.
    fn verify_webhook_signature(&self, payload: &[u8], signature_header: &str) -> Result<()>;
}

#[async_trait]
#[automock]
pub trait FxRateProvider {
    async fn get_current_rate(&self, from: &str, to: &str) -> Result<f64>;
}

/// Fire-and-forget operational alerting. Implementations must not block the
/// calling flow on delivery.
#[async_trait]
#[automock]
pub trait AlertSink {
    async fn send(&self, alert: AlertPayload) -> Result<()>;
}

#[async_trait]
#[automock]
pub trait CommissionRateSource {
    /// Expected marketplace commission rate, e.g. 0.15.
    async fn expected_rate(&self) -> Result<f64>;
}
