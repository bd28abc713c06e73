use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::{gateways::FxRateProvider, usecases::fx::FxSnapshotService},
    domain::{
        entities::risk_snapshots::NewRiskSnapshotEntity,
        repositories::risk_snapshots::RiskSnapshotRepository,
        value_objects::{
            enums::coverage_upgrades::CoverageUpgrade,
            money::round2,
            risk::{
                CREDIT_SECURITY_HIGH_USD, CREDIT_SECURITY_LOW_USD,
                CREDIT_SECURITY_VALUE_CUTOFF_USD, CalculateRiskSnapshotParams, GUARANTEE_TIERS,
                HOLD_MAX_USD, HOLD_MIN_USD, ROLLOVER_MULTIPLIER, RiskSnapshot,
                TOP_TIER_DEDUCTIBLE_USD,
            },
        },
    },
};

const FX_SANE_MIN: f64 = 100.0;
const FX_SANE_MAX: f64 = 20_000.0;

#[derive(Debug, Error, PartialEq)]
pub enum RiskValidationError {
    #[error("hold estimate {0} USD is outside the {HOLD_MIN_USD}-{HOLD_MAX_USD} band")]
    HoldOutOfBand(f64),
    #[error("fx rate {0} is outside the plausible band")]
    FxRateOutOfBand(f64),
    #[error("credit security {0} USD is not an allowed amount")]
    InvalidCreditSecurity(f64),
    #[error("deductible must not be negative")]
    NegativeDeductible,
    #[error("rollover deductible does not match the deductible")]
    RolloverMismatch,
}

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("vehicle value must be positive")]
    InvalidVehicleValue,
    #[error(transparent)]
    Validation(#[from] RiskValidationError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RiskError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            RiskError::InvalidVehicleValue | RiskError::Validation(_) => StatusCode::BAD_REQUEST,
            RiskError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Base damage deductible for a vehicle value, per the guarantee tier table.
pub fn base_deductible_usd(vehicle_value_usd: f64) -> f64 {
    for (max_value, deductible) in GUARANTEE_TIERS {
        if vehicle_value_usd < max_value {
            return deductible;
        }
    }
    TOP_TIER_DEDUCTIBLE_USD
}

pub fn calculate_risk_snapshot(
    params: &CalculateRiskSnapshotParams,
    captured_at: DateTime<Utc>,
) -> RiskSnapshot {
    let deductible_usd =
        base_deductible_usd(params.vehicle_value_usd) * params.coverage_upgrade.deductible_multiplier();
    let rollover_deductible_usd = deductible_usd * ROLLOVER_MULTIPLIER;

    // Zero coverage places no guarantee hold at all.
    let hold_estimated_usd = if params.coverage_upgrade == CoverageUpgrade::Zero {
        0.0
    } else {
        (rollover_deductible_usd * params.pricing_bucket.hold_factor())
            .clamp(HOLD_MIN_USD, HOLD_MAX_USD)
    };
    let hold_estimated_ars = round2(hold_estimated_usd * params.fx_rate);

    let credit_security_usd = if params.vehicle_value_usd <= CREDIT_SECURITY_VALUE_CUTOFF_USD {
        CREDIT_SECURITY_LOW_USD
    } else {
        CREDIT_SECURITY_HIGH_USD
    };

    RiskSnapshot {
        vehicle_value_usd: params.vehicle_value_usd,
        pricing_bucket: params.pricing_bucket,
        coverage_upgrade: params.coverage_upgrade,
        deductible_usd,
        rollover_deductible_usd,
        hold_estimated_usd,
        hold_estimated_ars,
        credit_security_usd,
        fx_rate: params.fx_rate,
        captured_at,
    }
}

pub fn validate_risk_snapshot(snapshot: &RiskSnapshot) -> Result<(), RiskValidationError> {
    if snapshot.deductible_usd < 0.0 {
        return Err(RiskValidationError::NegativeDeductible);
    }

    let expected_rollover = snapshot.deductible_usd * ROLLOVER_MULTIPLIER;
    if (snapshot.rollover_deductible_usd - expected_rollover).abs() > 0.01 {
        return Err(RiskValidationError::RolloverMismatch);
    }

    if snapshot.coverage_upgrade != CoverageUpgrade::Zero
        && !(HOLD_MIN_USD..=HOLD_MAX_USD).contains(&snapshot.hold_estimated_usd)
    {
        return Err(RiskValidationError::HoldOutOfBand(
            snapshot.hold_estimated_usd,
        ));
    }

    if !(FX_SANE_MIN..=FX_SANE_MAX).contains(&snapshot.fx_rate) {
        return Err(RiskValidationError::FxRateOutOfBand(snapshot.fx_rate));
    }

    if snapshot.credit_security_usd != CREDIT_SECURITY_LOW_USD
        && snapshot.credit_security_usd != CREDIT_SECURITY_HIGH_USD
    {
        return Err(RiskValidationError::InvalidCreditSecurity(
            snapshot.credit_security_usd,
        ));
    }

    Ok(())
}

pub struct RiskSnapshotUseCase<R, F>
where
    R: RiskSnapshotRepository + Send + Sync + 'static,
    F: FxRateProvider + Send + Sync + 'static,
{
    risk_snapshot_repo: Arc<R>,
    fx: FxSnapshotService<F>,
}

impl<R, F> RiskSnapshotUseCase<R, F>
where
    R: RiskSnapshotRepository + Send + Sync + 'static,
    F: FxRateProvider + Send + Sync + 'static,
{
    pub fn new(risk_snapshot_repo: Arc<R>, fx_provider: Arc<F>) -> Self {
        Self {
            risk_snapshot_repo,
            fx: FxSnapshotService::new(fx_provider),
        }
    }

    /// Computes, validates and persists a risk snapshot for a booking using
    /// the current USD to ARS rate.
    pub async fn create_snapshot(
        &self,
        booking_id: Uuid,
        vehicle_value_usd: f64,
        pricing_bucket: crate::domain::value_objects::enums::pricing_buckets::PricingBucket,
        coverage_upgrade: CoverageUpgrade,
    ) -> Result<RiskSnapshot, RiskError> {
        if vehicle_value_usd <= 0.0 {
            let err = RiskError::InvalidVehicleValue;
            warn!(
                %booking_id,
                vehicle_value_usd,
                status = err.status_code().as_u16(),
                "risk: rejected non-positive vehicle value"
            );
            return Err(err);
        }

        let fx_snapshot = self.fx.capture_snapshot("USD", "ARS").await.map_err(|err| {
            error!(%booking_id, error = ?err, "risk: failed to fetch fx rate");
            RiskError::Internal(err)
        })?;

        let params = CalculateRiskSnapshotParams {
            vehicle_value_usd,
            pricing_bucket,
            coverage_upgrade,
            fx_rate: fx_snapshot.rate,
        };
        let snapshot = calculate_risk_snapshot(&params, Utc::now());
        validate_risk_snapshot(&snapshot)?;

        self.risk_snapshot_repo
            .create(NewRiskSnapshotEntity {
                booking_id,
                vehicle_value_usd: snapshot.vehicle_value_usd,
                pricing_bucket: snapshot.pricing_bucket.to_string(),
                coverage_upgrade: snapshot.coverage_upgrade.to_string(),
                deductible_usd: snapshot.deductible_usd,
                rollover_deductible_usd: snapshot.rollover_deductible_usd,
                hold_estimated_usd: snapshot.hold_estimated_usd,
                hold_estimated_ars: snapshot.hold_estimated_ars,
                credit_security_usd: snapshot.credit_security_usd,
                fx_rate: snapshot.fx_rate,
                captured_at: snapshot.captured_at,
            })
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "risk: failed to persist snapshot");
                RiskError::Internal(err)
            })?;

        info!(
            %booking_id,
            hold_estimated_usd = snapshot.hold_estimated_usd,
            credit_security_usd = snapshot.credit_security_usd,
            "risk: snapshot created"
        );

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::gateways::MockFxRateProvider;
    use crate::domain::repositories::risk_snapshots::MockRiskSnapshotRepository;
    use crate::domain::value_objects::enums::pricing_buckets::PricingBucket;
    use mockall::predicate::eq;

    fn params(
        vehicle_value_usd: f64,
        pricing_bucket: PricingBucket,
        coverage_upgrade: CoverageUpgrade,
    ) -> CalculateRiskSnapshotParams {
        CalculateRiskSnapshotParams {
            vehicle_value_usd,
            pricing_bucket,
            coverage_upgrade,
            fx_rate: 1000.0,
        }
    }

    #[test]
    fn deductible_follows_the_tier_table() {
        assert_eq!(base_deductible_usd(7_999.0), 300.0);
        assert_eq!(base_deductible_usd(8_000.0), 500.0);
        assert_eq!(base_deductible_usd(14_999.0), 500.0);
        assert_eq!(base_deductible_usd(20_000.0), 800.0);
        assert_eq!(base_deductible_usd(39_000.0), 1_500.0);
        assert_eq!(base_deductible_usd(69_999.0), 2_500.0);
        assert_eq!(base_deductible_usd(120_000.0), 4_000.0);
    }

    #[test]
    fn premium_coverage_halves_the_deductible() {
        let snapshot = calculate_risk_snapshot(
            &params(10_000.0, PricingBucket::Standard, CoverageUpgrade::Premium50),
            Utc::now(),
        );

        assert_eq!(snapshot.deductible_usd, 250.0);
        assert_eq!(snapshot.rollover_deductible_usd, 375.0);
        assert_eq!(snapshot.hold_estimated_usd, 375.0);
        assert_eq!(snapshot.hold_estimated_ars, 375_000.0);
    }

    #[test]
    fn zero_coverage_removes_deductible_and_hold() {
        let snapshot = calculate_risk_snapshot(
            &params(30_000.0, PricingBucket::Premium, CoverageUpgrade::Zero),
            Utc::now(),
        );

        assert_eq!(snapshot.deductible_usd, 0.0);
        assert_eq!(snapshot.rollover_deductible_usd, 0.0);
        assert_eq!(snapshot.hold_estimated_usd, 0.0);
        assert!(validate_risk_snapshot(&snapshot).is_ok());
    }

    #[test]
    fn hold_is_clamped_to_the_upper_band() {
        let snapshot = calculate_risk_snapshot(
            &params(120_000.0, PricingBucket::UltraLuxury, CoverageUpgrade::Standard),
            Utc::now(),
        );

        // 4000 * 1.5 * 1.75 would be 10500; the band caps it.
        assert_eq!(snapshot.hold_estimated_usd, 2_000.0);
        assert!(validate_risk_snapshot(&snapshot).is_ok());
    }

    #[test]
    fn credit_security_uses_the_value_cutoff() {
        let low = calculate_risk_snapshot(
            &params(20_000.0, PricingBucket::Standard, CoverageUpgrade::Standard),
            Utc::now(),
        );
        let high = calculate_risk_snapshot(
            &params(20_001.0, PricingBucket::Standard, CoverageUpgrade::Standard),
            Utc::now(),
        );

        assert_eq!(low.credit_security_usd, 300.0);
        assert_eq!(high.credit_security_usd, 500.0);
    }

    #[test]
    fn validation_rejects_out_of_band_values() {
        let mut snapshot = calculate_risk_snapshot(
            &params(10_000.0, PricingBucket::Standard, CoverageUpgrade::Standard),
            Utc::now(),
        );

        snapshot.fx_rate = 5.0;
        assert_eq!(
            validate_risk_snapshot(&snapshot),
            Err(RiskValidationError::FxRateOutOfBand(5.0))
        );

        snapshot.fx_rate = 1000.0;
        snapshot.credit_security_usd = 450.0;
        assert_eq!(
            validate_risk_snapshot(&snapshot),
            Err(RiskValidationError::InvalidCreditSecurity(450.0))
        );
    }

    #[tokio::test]
    async fn create_snapshot_persists_validated_values() {
        let booking_id = Uuid::new_v4();

        let mut fx_provider = MockFxRateProvider::new();
        fx_provider
            .expect_get_current_rate()
            .with(eq("USD"), eq("ARS"))
            .returning(|_, _| Box::pin(async { Ok(1000.0) }));

        let mut risk_snapshot_repo = MockRiskSnapshotRepository::new();
        risk_snapshot_repo
            .expect_create()
            .withf(move |entity| {
                entity.booking_id == booking_id
                    && entity.deductible_usd == 500.0
                    && entity.hold_estimated_usd == 750.0
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let usecase = RiskSnapshotUseCase::new(Arc::new(risk_snapshot_repo), Arc::new(fx_provider));

        let snapshot = usecase
            .create_snapshot(
                booking_id,
                10_000.0,
                PricingBucket::Standard,
                CoverageUpgrade::Standard,
            )
            .await
            .unwrap();

        assert_eq!(snapshot.hold_estimated_ars, 750_000.0);
        assert_eq!(snapshot.credit_security_usd, 300.0);
    }

    #[tokio::test]
    async fn create_snapshot_rejects_non_positive_vehicle_value() {
        let fx_provider = MockFxRateProvider::new();
        let risk_snapshot_repo = MockRiskSnapshotRepository::new();

        let usecase = RiskSnapshotUseCase::new(Arc::new(risk_snapshot_repo), Arc::new(fx_provider));

        let err = usecase
            .create_snapshot(
                Uuid::new_v4(),
                0.0,
                PricingBucket::Standard,
                CoverageUpgrade::Standard,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RiskError::InvalidVehicleValue));
    }
}
