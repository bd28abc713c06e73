use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info};

use crate::{application::gateways::FxRateProvider, domain::value_objects::fx::FxSnapshot};

/// Why a stored quote can no longer be used as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum FxRevalidation {
    Valid,
    Expired,
    Drifted { current_rate: f64 },
}

pub struct FxSnapshotService<F>
where
    F: FxRateProvider + Send + Sync + 'static,
{
    fx_provider: Arc<F>,
}

impl<F> FxSnapshotService<F>
where
    F: FxRateProvider + Send + Sync + 'static,
{
    pub fn new(fx_provider: Arc<F>) -> Self {
        Self { fx_provider }
    }

    /// Captures a fresh snapshot of the current rate.
    pub async fn capture_snapshot(&self, from: &str, to: &str) -> Result<FxSnapshot> {
        let rate = self
            .fx_provider
            .get_current_rate(from, to)
            .await
            .map_err(|err| {
                error!(from, to, error = ?err, "fx: failed to fetch current rate");
                err
            })?;

        let snapshot = FxSnapshot::capture(from, to, rate, Utc::now());
        info!(from, to, rate, "fx: snapshot captured");
        Ok(snapshot)
    }

    /// Checks whether a stored snapshot is still usable for quoting.
    pub async fn revalidate(&self, snapshot: &FxSnapshot) -> Result<FxRevalidation> {
        if snapshot.is_expired(Utc::now()) {
            return Ok(FxRevalidation::Expired);
        }

        let current_rate = self
            .fx_provider
            .get_current_rate(&snapshot.from_currency, &snapshot.to_currency)
            .await?;

        if snapshot.requires_revalidation(current_rate) {
            return Ok(FxRevalidation::Drifted { current_rate });
        }

        Ok(FxRevalidation::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::gateways::MockFxRateProvider;
    use chrono::Duration;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn capture_snapshot_uses_the_current_rate() {
        let mut fx_provider = MockFxRateProvider::new();
        fx_provider
            .expect_get_current_rate()
            .with(eq("USD"), eq("ARS"))
            .returning(|_, _| Box::pin(async { Ok(1250.0) }));

        let service = FxSnapshotService::new(Arc::new(fx_provider));
        let snapshot = service.capture_snapshot("USD", "ARS").await.unwrap();

        assert_eq!(snapshot.rate, 1250.0);
        assert_eq!(snapshot.expires_at - snapshot.captured_at, Duration::days(7));
    }

    #[tokio::test]
    async fn revalidate_flags_expired_snapshots_without_calling_the_provider() {
        let fx_provider = MockFxRateProvider::new();
        let service = FxSnapshotService::new(Arc::new(fx_provider));

        let mut snapshot = FxSnapshot::capture("USD", "ARS", 1000.0, Utc::now());
        snapshot.expires_at = Utc::now() - Duration::hours(1);

        let outcome = service.revalidate(&snapshot).await.unwrap();
        assert_eq!(outcome, FxRevalidation::Expired);
    }

    #[tokio::test]
    async fn revalidate_flags_drift_beyond_the_threshold() {
        let mut fx_provider = MockFxRateProvider::new();
        fx_provider
            .expect_get_current_rate()
            .returning(|_, _| Box::pin(async { Ok(1150.0) }));

        let service = FxSnapshotService::new(Arc::new(fx_provider));
        let snapshot = FxSnapshot::capture("USD", "ARS", 1000.0, Utc::now());

        let outcome = service.revalidate(&snapshot).await.unwrap();
        assert_eq!(
            outcome,
            FxRevalidation::Drifted {
                current_rate: 1150.0
            }
        );
    }

    #[tokio::test]
    async fn revalidate_accepts_small_drift() {
        let mut fx_provider = MockFxRateProvider::new();
        fx_provider
            .expect_get_current_rate()
            .returning(|_, _| Box::pin(async { Ok(1050.0) }));

        let service = FxSnapshotService::new(Arc::new(fx_provider));
        let snapshot = FxSnapshot::capture("USD", "ARS", 1000.0, Utc::now());

        let outcome = service.revalidate(&snapshot).await.unwrap();
        assert_eq!(outcome, FxRevalidation::Valid);
    }
}
