use std::sync::Arc;

use anyhow::anyhow;
use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::gateways::PaymentProviderGateway,
    domain::{
        entities::card_holds::NewCardHoldEntity,
        repositories::{
            bookings::BookingRepository, card_holds::CardHoldRepository,
            risk_snapshots::RiskSnapshotRepository,
        },
        value_objects::enums::card_hold_statuses::CardHoldStatus,
    },
};

const HOLD_VALIDITY_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum GuaranteeHoldError {
    #[error("booking not found")]
    BookingNotFound,
    #[error("no risk snapshot exists for the booking")]
    MissingRiskSnapshot,
    #[error("no active hold exists for the booking")]
    NoActiveHold,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GuaranteeHoldError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            GuaranteeHoldError::BookingNotFound | GuaranteeHoldError::NoActiveHold => {
                StatusCode::NOT_FOUND
            }
            GuaranteeHoldError::MissingRiskSnapshot => StatusCode::CONFLICT,
            GuaranteeHoldError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Summary returned by every hold operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HoldOutcome {
    pub booking_id: Uuid,
    pub hold_id: Uuid,
    pub provider_hold_id: String,
    pub amount_usd: f64,
    pub amount_ars: f64,
    pub status: String,
}

/// Places, captures and releases the card pre-authorization that backs a
/// booking's damage guarantee. The amounts come from the latest risk
/// snapshot, never from the caller.
pub struct GuaranteeHoldService<B, H, R, G>
where
    B: BookingRepository + Send + Sync + 'static,
    H: CardHoldRepository + Send + Sync + 'static,
    R: RiskSnapshotRepository + Send + Sync + 'static,
    G: PaymentProviderGateway + Send + Sync + 'static,
{
    booking_repo: Arc<B>,
    card_hold_repo: Arc<H>,
    risk_snapshot_repo: Arc<R>,
    provider: Arc<G>,
}

impl<B, H, R, G> GuaranteeHoldService<B, H, R, G>
where
    B: BookingRepository + Send + Sync + 'static,
    H: CardHoldRepository + Send + Sync + 'static,
    R: RiskSnapshotRepository + Send + Sync + 'static,
    G: PaymentProviderGateway + Send + Sync + 'static,
{
    pub fn new(
        booking_repo: Arc<B>,
        card_hold_repo: Arc<H>,
        risk_snapshot_repo: Arc<R>,
        provider: Arc<G>,
    ) -> Self {
        Self {
            booking_repo,
            card_hold_repo,
            risk_snapshot_repo,
            provider,
        }
    }

    /// Places the hold for a booking. Idempotent: an existing active hold is
    /// returned as-is instead of stacking a second pre-authorization.
    pub async fn place_hold(&self, booking_id: Uuid) -> Result<HoldOutcome, GuaranteeHoldError> {
        self.booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(GuaranteeHoldError::Internal)?
            .ok_or(GuaranteeHoldError::BookingNotFound)?;

        if let Some(existing) = self
            .card_hold_repo
            .find_active_by_booking_id(booking_id)
            .await
            .map_err(GuaranteeHoldError::Internal)?
        {
            info!(
                %booking_id,
                hold_id = %existing.id,
                "holds: active hold already placed, returning it"
            );
            return Ok(HoldOutcome {
                booking_id,
                hold_id: existing.id,
                provider_hold_id: existing.provider_hold_id,
                amount_usd: existing.amount_usd,
                amount_ars: existing.amount_ars,
                status: existing.status,
            });
        }

        let snapshot = self
            .risk_snapshot_repo
            .find_latest_by_booking_id(booking_id)
            .await
            .map_err(GuaranteeHoldError::Internal)?
            .ok_or_else(|| {
                warn!(%booking_id, "holds: no risk snapshot, refusing to place hold");
                GuaranteeHoldError::MissingRiskSnapshot
            })?;

        let provider_hold = self
            .provider
            .create_hold(booking_id, snapshot.hold_estimated_ars)
            .await
            .map_err(|err| {
                error!(%booking_id, error = ?err, "holds: provider rejected pre-authorization");
                GuaranteeHoldError::Internal(err)
            })?;

        let now = Utc::now();
        let hold_id = self
            .card_hold_repo
            .create(NewCardHoldEntity {
                booking_id,
                provider_hold_id: provider_hold.id.clone(),
                amount_usd: snapshot.hold_estimated_usd,
                amount_ars: snapshot.hold_estimated_ars,
                status: CardHoldStatus::Active.to_string(),
                placed_at: now,
                expires_at: now + Duration::days(HOLD_VALIDITY_DAYS),
            })
            .await
            .map_err(|err| {
                error!(
                    %booking_id,
                    provider_hold_id = %provider_hold.id,
                    db_error = ?err,
                    "holds: failed to record hold placed at the provider"
                );
                GuaranteeHoldError::Internal(err)
            })?;

        info!(
            %booking_id,
            %hold_id,
            amount_usd = snapshot.hold_estimated_usd,
            amount_ars = snapshot.hold_estimated_ars,
            "holds: pre-authorization placed"
        );

        Ok(HoldOutcome {
            booking_id,
            hold_id,
            provider_hold_id: provider_hold.id,
            amount_usd: snapshot.hold_estimated_usd,
            amount_ars: snapshot.hold_estimated_ars,
            status: CardHoldStatus::Active.to_string(),
        })
    }

    /// Releases the active hold without charging the renter.
    pub async fn release_hold(&self, booking_id: Uuid) -> Result<HoldOutcome, GuaranteeHoldError> {
        let hold = self.require_active_hold(booking_id).await?;

        self.provider
            .cancel_hold(&hold.provider_hold_id)
            .await
            .map_err(|err| {
                error!(
                    %booking_id,
                    provider_hold_id = %hold.provider_hold_id,
                    error = ?err,
                    "holds: provider failed to cancel pre-authorization"
                );
                GuaranteeHoldError::Internal(err)
            })?;

        let transitioned = self
            .card_hold_repo
            .transition_status(hold.id, CardHoldStatus::Active, CardHoldStatus::Cancelled)
            .await
            .map_err(GuaranteeHoldError::Internal)?;
        if !transitioned {
            warn!(%booking_id, hold_id = %hold.id, "holds: hold already left active state");
        }

        info!(%booking_id, hold_id = %hold.id, "holds: pre-authorization released");
        Ok(HoldOutcome {
            booking_id,
            hold_id: hold.id,
            provider_hold_id: hold.provider_hold_id,
            amount_usd: hold.amount_usd,
            amount_ars: hold.amount_ars,
            status: CardHoldStatus::Cancelled.to_string(),
        })
    }

    /// Captures the active hold after a damage claim.
    pub async fn capture_hold(&self, booking_id: Uuid) -> Result<HoldOutcome, GuaranteeHoldError> {
        let hold = self.require_active_hold(booking_id).await?;

        self.provider
            .capture_hold(&hold.provider_hold_id)
            .await
            .map_err(|err| {
                error!(
                    %booking_id,
                    provider_hold_id = %hold.provider_hold_id,
                    error = ?err,
                    "holds: provider failed to capture pre-authorization"
                );
                GuaranteeHoldError::Internal(err)
            })?;

        let transitioned = self
            .card_hold_repo
            .transition_status(hold.id, CardHoldStatus::Active, CardHoldStatus::Captured)
            .await
            .map_err(GuaranteeHoldError::Internal)?;
        if !transitioned {
            warn!(%booking_id, hold_id = %hold.id, "holds: hold already left active state");
        }

        info!(
            %booking_id,
            hold_id = %hold.id,
            amount_usd = hold.amount_usd,
            "holds: pre-authorization captured"
        );
        Ok(HoldOutcome {
            booking_id,
            hold_id: hold.id,
            provider_hold_id: hold.provider_hold_id,
            amount_usd: hold.amount_usd,
            amount_ars: hold.amount_ars,
            status: CardHoldStatus::Captured.to_string(),
        })
    }

    async fn require_active_hold(
        &self,
        booking_id: Uuid,
    ) -> Result<crate::domain::entities::card_holds::CardHoldEntity, GuaranteeHoldError> {
        self.card_hold_repo
            .find_active_by_booking_id(booking_id)
            .await
            .map_err(GuaranteeHoldError::Internal)?
            .ok_or_else(|| {
                warn!(%booking_id, "holds: no active hold for booking");
                GuaranteeHoldError::NoActiveHold
            })
    }
}
