use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::application::gateways::CommissionRateSource;

const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Reads the expected marketplace commission rate from a remote config
/// document. Falls back to the configured default when the endpoint is
/// missing or unreachable.
pub struct RemoteCommissionConfig {
    http: reqwest::Client,
    config_url: Option<String>,
    default_rate: f64,
}

#[derive(Debug, Deserialize)]
struct CommissionConfig {
    commission_rate: f64,
}

impl RemoteCommissionConfig {
    pub fn new(config_url: Option<String>, default_rate: f64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            config_url,
            default_rate,
        }
    }
}

#[async_trait]
impl CommissionRateSource for RemoteCommissionConfig {
    async fn expected_rate(&self) -> Result<f64> {
        let Some(url) = self.config_url.as_deref() else {
            return Ok(self.default_rate);
        };

        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            warn!(status = %resp.status(), "commission config endpoint failed");
            return Err(anyhow!(
                "commission config request failed with status {}",
                resp.status()
            ));
        }

        let config: CommissionConfig = resp.json().await?;
        if !(0.0..1.0).contains(&config.commission_rate) {
            return Err(anyhow!(
                "commission rate out of range: {}",
                config.commission_rate
            ));
        }

        Ok(config.commission_rate)
    }
}
