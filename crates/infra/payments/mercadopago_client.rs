use anyhow::Result;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use tracing::error;
use uuid::Uuid;

use crate::{
    application::gateways::PaymentProviderGateway,
    domain::value_objects::provider::{
        ProviderCheckout, ProviderHold, ProviderOrder, ProviderPayment, ProviderPreapproval,
        ProviderRefund,
    },
};

type HmacSha256 = Hmac<Sha256>;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Minimal MercadoPago client built on reqwest.
pub struct MercadoPagoClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    webhook_secret: String,
    back_url: String,
}

#[derive(Debug, Deserialize)]
struct PreferenceResponse {
    id: String,
    init_point: String,
}

#[derive(Debug, Deserialize)]
struct PaymentSearchResponse {
    #[serde(default)]
    results: Vec<ProviderPayment>,
}

#[derive(Debug, Deserialize)]
struct HoldResponse {
    id: serde_json::Number,
    transaction_amount: f64,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    id: serde_json::Number,
}

#[derive(Debug, Deserialize)]
struct MpErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
    status: Option<i64>,
}

impl MercadoPagoClient {
    pub fn new(
        base_url: String,
        access_token: String,
        webhook_secret: String,
        back_url: String,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url,
            access_token,
            webhook_secret,
            back_url,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (mp_error, mp_message, mp_status) =
            match serde_json::from_str::<MpErrorEnvelope>(&body) {
                Ok(envelope) => (envelope.error, envelope.message, envelope.status),
                Err(_) => (None, None, None),
            };

        error!(
            status = %status,
            mp_request_id = ?request_id,
            mp_error = ?mp_error,
            mp_message = ?mp_message,
            mp_status = ?mp_status,
            response_body = %body,
            context = %context,
            "mercadopago api request failed"
        );

        anyhow::bail!(
            "MercadoPago API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

#[async_trait]
impl PaymentProviderGateway for MercadoPagoClient {
    async fn create_checkout(
        &self,
        booking_id: Uuid,
        amount_ars: f64,
        description: &str,
    ) -> Result<ProviderCheckout> {
        // https://www.mercadopago.com.ar/developers/en/reference/preferences/_checkout_preferences/post
        let body = json!({
            "external_reference": booking_id.to_string(),
            "items": [{
                "title": description,
                "quantity": 1,
                "currency_id": "ARS",
                "unit_price": amount_ars,
            }],
            "back_urls": {
                "success": self.back_url,
                "failure": self.back_url,
                "pending": self.back_url,
            },
            "auto_return": "approved",
        });

        let resp = self
            .http
            .post(format!("{}/checkout/preferences", self.base_url))
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create checkout preference").await?;

        let parsed: PreferenceResponse = resp.json().await?;
        Ok(ProviderCheckout {
            preference_id: parsed.id,
            redirect_url: parsed.init_point,
        })
    }

    async fn get_payment(&self, provider_payment_id: &str) -> Result<ProviderPayment> {
        let resp = self
            .http
            .get(format!("{}/v1/payments/{}", self.base_url, provider_payment_id))
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "get payment").await?;

        let payment: ProviderPayment = resp.json().await?;
        Ok(payment)
    }

    async fn search_payments_by_booking_id(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<ProviderPayment>> {
        // https://www.mercadopago.com.ar/developers/en/reference/payments/_payments_search/get
        let resp = self
            .http
            .get(format!("{}/v1/payments/search", self.base_url))
            .query(&[("external_reference", booking_id.to_string())])
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "search payments").await?;

        let parsed: PaymentSearchResponse = resp.json().await?;
        Ok(parsed.results)
    }

    async fn get_merchant_order(&self, order_id: &str) -> Result<ProviderOrder> {
        let resp = self
            .http
            .get(format!("{}/merchant_orders/{}", self.base_url, order_id))
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "get merchant order").await?;

        let order: ProviderOrder = resp.json().await?;
        Ok(order)
    }

    async fn get_preapproval(&self, preapproval_id: &str) -> Result<ProviderPreapproval> {
        let resp = self
            .http
            .get(format!("{}/preapproval/{}", self.base_url, preapproval_id))
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "get preapproval").await?;

        let preapproval: ProviderPreapproval = resp.json().await?;
        Ok(preapproval)
    }

    async fn create_hold(&self, booking_id: Uuid, amount_ars: f64) -> Result<ProviderHold> {
        // capture=false places a pre-authorization that must be captured or
        // cancelled explicitly later.
        let body = json!({
            "external_reference": booking_id.to_string(),
            "transaction_amount": amount_ars,
            "capture": false,
            "description": format!("Guarantee hold for booking {booking_id}"),
        });

        let resp = self
            .http
            .post(format!("{}/v1/payments", self.base_url))
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create hold").await?;

        let parsed: HoldResponse = resp.json().await?;
        Ok(ProviderHold {
            id: parsed.id.to_string(),
            amount_ars: parsed.transaction_amount,
        })
    }

    async fn capture_hold(&self, provider_hold_id: &str) -> Result<()> {
        let resp = self
            .http
            .put(format!("{}/v1/payments/{}", self.base_url, provider_hold_id))
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "capture": true }))
            .send()
            .await?;
        Self::ensure_success(resp, "capture hold").await?;

        Ok(())
    }

    async fn cancel_hold(&self, provider_hold_id: &str) -> Result<()> {
        let resp = self
            .http
            .put(format!("{}/v1/payments/{}", self.base_url, provider_hold_id))
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "status": "cancelled" }))
            .send()
            .await?;
        Self::ensure_success(resp, "cancel hold").await?;

        Ok(())
    }

    async fn refund_payment(
        &self,
        provider_payment_id: &str,
        amount_ars: Option<f64>,
    ) -> Result<ProviderRefund> {
        // Omitting the amount refunds the payment in full.
        let body = match amount_ars {
            Some(amount) => json!({ "amount": amount }),
            None => json!({}),
        };

        let resp = self
            .http
            .post(format!(
                "{}/v1/payments/{}/refunds",
                self.base_url, provider_payment_id
            ))
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "refund payment").await?;

        let parsed: RefundResponse = resp.json().await?;
        Ok(ProviderRefund {
            id: parsed.id.to_string(),
        })
    }

    /// Verifies the `x-signature` header: `ts=<unix>,v1=<hex hmac>` over
    /// `<ts>.<raw body>` keyed with the webhook secret.
    fn verify_webhook_signature(&self, payload: &[u8], signature_header: &str) -> Result<()> {
        let mut timestamp: Option<String> = None;
        let mut signature: Option<String> = None;

        for part in signature_header.split(',') {
            let part = part.trim();
            if let Some(rest) = part.strip_prefix("ts=") {
                timestamp = Some(rest.to_string());
            } else if let Some(rest) = part.strip_prefix("v1=") {
                signature = Some(rest.to_string());
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| anyhow::anyhow!("missing ts in x-signature"))?;
        let signature =
            signature.ok_or_else(|| anyhow::anyhow!("missing v1 in x-signature"))?;

        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())?;
        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();
        let provided = hex::decode(signature)?;

        if expected[..] != provided[..] {
            anyhow::bail!("invalid webhook signature");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_secret(secret: &str) -> MercadoPagoClient {
        MercadoPagoClient::new(
            "https://api.mercadopago.com".to_string(),
            "test-token".to_string(),
            secret.to_string(),
            "https://example.com/bookings".to_string(),
        )
    }

    fn sign(secret: &str, timestamp: &str, payload: &[u8]) -> String {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed_payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_a_correctly_signed_payload() {
        let client = client_with_secret("whsec");
        let payload = br#"{"status":"approved"}"#;
        let signature = sign("whsec", "1700000000", payload);
        let header = format!("ts=1700000000,v1={signature}");

        assert!(client.verify_webhook_signature(payload, &header).is_ok());
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let client = client_with_secret("whsec");
        let signature = sign("whsec", "1700000000", br#"{"status":"approved"}"#);
        let header = format!("ts=1700000000,v1={signature}");

        assert!(
            client
                .verify_webhook_signature(br#"{"status":"rejected"}"#, &header)
                .is_err()
        );
    }

    #[test]
    fn rejects_a_header_without_signature_parts() {
        let client = client_with_secret("whsec");
        assert!(
            client
                .verify_webhook_signature(b"{}", "ts=1700000000")
                .is_err()
        );
    }
}
