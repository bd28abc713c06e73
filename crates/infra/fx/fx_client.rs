use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::error;

use crate::application::gateways::FxRateProvider;

const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Exchange rate client for a quote endpoint shaped like
/// `GET {base}/rates?from=USD&to=ARS` returning `{"rate": 1234.5}`.
pub struct FxClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct RateResponse {
    rate: f64,
}

impl FxClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl FxRateProvider for FxClient {
    async fn get_current_rate(&self, from: &str, to: &str) -> Result<f64> {
        let resp = self
            .http
            .get(format!("{}/rates", self.base_url))
            .query(&[("from", from), ("to", to)])
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            error!(from, to, status = %status, "fx api request failed");
            return Err(anyhow!("FX API request failed with status {status}"));
        }

        let parsed: RateResponse = resp.json().await?;
        if !parsed.rate.is_finite() || parsed.rate <= 0.0 {
            return Err(anyhow!("FX API returned a non-positive rate: {}", parsed.rate));
        }

        Ok(parsed.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unresponsive_endpoint_errors_instead_of_hanging() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept connections and hold them open without ever answering.
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = FxClient::new(format!("http://{addr}"), "test-key".to_string());
        let result = tokio::time::timeout(
            Duration::from_secs(REQUEST_TIMEOUT_SECS + 2),
            client.get_current_rate("USD", "ARS"),
        )
        .await
        .expect("request must fail on its own timeout");

        assert!(result.is_err());
    }
}
