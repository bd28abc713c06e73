use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;
use url::Url;

use crate::{application::gateways::AlertSink, domain::value_objects::alerts::AlertPayload};

const DELIVERY_TIMEOUT_SECS: u64 = 3;
const QUEUE_CAPACITY: usize = 256;

/// Posts alerts to the configured webhook URLs from a background task. The
/// calling flow only enqueues; a slow or dead webhook never blocks payments.
pub struct WebhookAlertSink {
    tx: mpsc::Sender<AlertPayload>,
}

impl WebhookAlertSink {
    pub fn new(webhook_urls: Vec<Url>) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertPayload>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(DELIVERY_TIMEOUT_SECS))
                .build()
                .unwrap_or_default();

            while let Some(alert) = rx.recv().await {
                for url in &webhook_urls {
                    let result = http.post(url.clone()).json(&alert).send().await;
                    match result {
                        Ok(resp) if resp.status().is_success() => {}
                        Ok(resp) => {
                            warn!(
                                status = %resp.status(),
                                host = %url.host_str().unwrap_or("unknown"),
                                "alerts: webhook delivery rejected"
                            );
                        }
                        Err(err) => {
                            // The error is sanitized: reqwest errors can echo
                            // the full URL, which may carry a token.
                            warn!(
                                host = %url.host_str().unwrap_or("unknown"),
                                timeout = err.is_timeout(),
                                connect = err.is_connect(),
                                "alerts: webhook delivery failed"
                            );
                        }
                    }
                }
            }
        });

        Self { tx }
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn send(&self, alert: AlertPayload) -> Result<()> {
        match self.tx.try_send(alert) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("alerts: queue full, dropping alert");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("alerts: queue closed, dropping alert");
                Ok(())
            }
        }
    }
}
