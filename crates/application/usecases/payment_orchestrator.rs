use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        gateways::{FxRateProvider, PaymentProviderGateway},
        usecases::settlement::SettlementService,
    },
    domain::{
        entities::{
            bookings::BookingEntity, dlq_items::NewDlqItemEntity,
            payment_intents::NewPaymentIntentEntity,
        },
        repositories::{
            bookings::BookingRepository, dlq::DlqRepository,
            payment_intents::PaymentIntentRepository, wallets::WalletRepository,
        },
        value_objects::{
            enums::{
                booking_statuses::BookingStatus, dlq_event_types::DlqEventType,
                dlq_statuses::DlqStatus, ledger_entry_kinds::LedgerEntryKind,
                payment_intent_statuses::PaymentIntentStatus, payment_methods::PaymentMethod,
            },
            money::{cents_to_usd, round2, usd_to_cents},
            payments::{BookingPaymentParams, PaymentResult, PaymentWebhookPayload, RefundParams,
                RefundResult},
            rejection_reasons::rejection_message,
            wallet::{LockOutcome, UnlockOutcome},
        },
    },
};

const PROVIDER_NAME: &str = "mercadopago";
const WALLET_PROVIDER_NAME: &str = "wallet";
const PARTIAL_REFUND_RATE: f64 = 0.5;
const AMOUNT_TOLERANCE_USD: f64 = 0.01;
pub const DLQ_DEFAULT_MAX_RETRIES: i32 = 5;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("booking not found")]
    BookingNotFound,
    #[error("invalid payment request: {0}")]
    InvalidRequest(String),
    #[error("insufficient wallet funds: {available_usd} available, {requested_usd} requested")]
    InsufficientFunds {
        available_usd: f64,
        requested_usd: f64,
    },
    #[error("invalid webhook payload: {0}")]
    InvalidWebhook(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentError::BookingNotFound => StatusCode::NOT_FOUND,
            PaymentError::InvalidRequest(_) | PaymentError::InvalidWebhook(_) => {
                StatusCode::BAD_REQUEST
            }
            PaymentError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            PaymentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PaymentError>;

/// Routes a booking payment across the wallet, the card provider, or both,
/// and owns the webhook and refund sides of the same flows.
pub struct PaymentOrchestrator<B, I, W, D, G, F>
where
    B: BookingRepository + Send + Sync + 'static,
    I: PaymentIntentRepository + Send + Sync + 'static,
    W: WalletRepository + Send + Sync + 'static,
    D: DlqRepository + Send + Sync + 'static,
    G: PaymentProviderGateway + Send + Sync + 'static,
    F: FxRateProvider + Send + Sync + 'static,
{
    booking_repo: Arc<B>,
    intent_repo: Arc<I>,
    wallet_repo: Arc<W>,
    dlq_repo: Arc<D>,
    provider: Arc<G>,
    fx_provider: Arc<F>,
    settlement: SettlementService<B, I>,
}

impl<B, I, W, D, G, F> PaymentOrchestrator<B, I, W, D, G, F>
where
    B: BookingRepository + Send + Sync + 'static,
    I: PaymentIntentRepository + Send + Sync + 'static,
    W: WalletRepository + Send + Sync + 'static,
    D: DlqRepository + Send + Sync + 'static,
    G: PaymentProviderGateway + Send + Sync + 'static,
    F: FxRateProvider + Send + Sync + 'static,
{
    pub fn new(
        booking_repo: Arc<B>,
        intent_repo: Arc<I>,
        wallet_repo: Arc<W>,
        dlq_repo: Arc<D>,
        provider: Arc<G>,
        fx_provider: Arc<F>,
    ) -> Self {
        let settlement =
            SettlementService::new(Arc::clone(&booking_repo), Arc::clone(&intent_repo));
        Self {
            booking_repo,
            intent_repo,
            wallet_repo,
            dlq_repo,
            provider,
            fx_provider,
            settlement,
        }
    }

    pub async fn process_booking_payment(
        &self,
        params: BookingPaymentParams,
    ) -> UseCaseResult<PaymentResult> {
        // The method string is parsed before anything else runs, so an
        // unknown method never touches the wallet or the provider.
        let method = PaymentMethod::from_str(&params.payment_method).ok_or_else(|| {
            let err = PaymentError::InvalidRequest(format!(
                "unknown payment method: {}",
                params.payment_method
            ));
            warn!(
                booking_id = %params.booking_id,
                payment_method = %params.payment_method,
                status = err.status_code().as_u16(),
                "payments: rejected unknown payment method"
            );
            err
        })?;

        let booking = self.load_booking(params.booking_id).await?;

        if booking.status != BookingStatus::PendingPayment.to_string() {
            let err = PaymentError::InvalidRequest(format!(
                "booking is not awaiting payment (status: {})",
                booking.status
            ));
            warn!(
                booking_id = %booking.id,
                booking_status = %booking.status,
                status = err.status_code().as_u16(),
                "payments: booking not payable"
            );
            return Err(err);
        }

        info!(
            booking_id = %booking.id,
            payment_method = %method,
            total_amount_usd = booking.total_amount_usd,
            "payments: processing booking payment"
        );

        match method {
            PaymentMethod::Wallet => self.process_wallet_payment(&booking).await,
            PaymentMethod::Card => self.process_card_payment(&booking).await,
            PaymentMethod::PartialWallet => self.process_partial_payment(&booking, &params).await,
        }
    }

    async fn process_wallet_payment(&self, booking: &BookingEntity) -> UseCaseResult<PaymentResult> {
        let amount_usd = booking.total_amount_usd;
        let fx_rate = self.current_fx_rate(booking.id).await?;

        match self
            .wallet_repo
            .lock_funds(booking.renter_id, booking.id, amount_usd, "wallet payment")
            .await
            .map_err(|err| {
                error!(
                    booking_id = %booking.id,
                    db_error = ?err,
                    "payments: wallet lock failed"
                );
                PaymentError::Internal(err)
            })? {
            LockOutcome::Locked(receipt) => {
                info!(
                    booking_id = %booking.id,
                    lock_id = %receipt.lock_id,
                    amount_usd,
                    "payments: wallet funds locked"
                );
            }
            LockOutcome::InsufficientFunds {
                available_usd,
                requested_usd,
            } => {
                let err = PaymentError::InsufficientFunds {
                    available_usd,
                    requested_usd,
                };
                warn!(
                    booking_id = %booking.id,
                    available_usd,
                    requested_usd,
                    status = err.status_code().as_u16(),
                    "payments: insufficient wallet funds"
                );
                return Err(err);
            }
        }

        // No compensating unlock past this point: a lock left behind by a
        // late failure surfaces in the reconciliation sweep for review.
        self.booking_repo
            .mark_payment(
                booking.id,
                PaymentMethod::Wallet,
                BookingStatus::Confirmed,
                Some(usd_to_cents(amount_usd)),
            )
            .await
            .map_err(|err| {
                error!(
                    booking_id = %booking.id,
                    db_error = ?err,
                    "payments: failed to confirm wallet booking, lock kept for review"
                );
                PaymentError::Internal(err)
            })?;

        let intent_id = self
            .intent_repo
            .create(NewPaymentIntentEntity {
                booking_id: booking.id,
                provider: WALLET_PROVIDER_NAME.to_string(),
                provider_payment_id: None,
                method: PaymentMethod::Wallet.to_string(),
                status: PaymentIntentStatus::Completed.to_string(),
                amount_usd,
                amount_ars: round2(amount_usd * fx_rate),
                fx_rate,
                commission_fee_usd: None,
                redirect_url: None,
                rejection_reason: None,
            })
            .await
            .map_err(|err| {
                error!(
                    booking_id = %booking.id,
                    db_error = ?err,
                    "payments: failed to record wallet intent"
                );
                PaymentError::Internal(err)
            })?;

        info!(booking_id = %booking.id, %intent_id, "payments: wallet payment completed");

        Ok(PaymentResult {
            booking_id: booking.id,
            booking_status: BookingStatus::Confirmed.to_string(),
            payment_method: PaymentMethod::Wallet.to_string(),
            intent_id: Some(intent_id),
            redirect_url: None,
            wallet_amount_usd: Some(amount_usd),
            card_amount_usd: None,
        })
    }

    async fn process_card_payment(&self, booking: &BookingEntity) -> UseCaseResult<PaymentResult> {
        let amount_usd = booking.total_amount_usd;
        let fx_rate = self.current_fx_rate(booking.id).await?;
        let amount_ars = round2(amount_usd * fx_rate);

        let checkout = self
            .provider
            .create_checkout(booking.id, amount_ars, &format!("Booking {}", booking.id))
            .await
            .map_err(|err| {
                error!(
                    booking_id = %booking.id,
                    error = ?err,
                    "payments: provider checkout creation failed"
                );
                PaymentError::Internal(err)
            })?;

        let intent_id = self
            .intent_repo
            .create(NewPaymentIntentEntity {
                booking_id: booking.id,
                provider: PROVIDER_NAME.to_string(),
                provider_payment_id: None,
                method: PaymentMethod::Card.to_string(),
                status: PaymentIntentStatus::Pending.to_string(),
                amount_usd,
                amount_ars,
                fx_rate,
                commission_fee_usd: None,
                redirect_url: Some(checkout.redirect_url.clone()),
                rejection_reason: None,
            })
            .await
            .map_err(|err| {
                error!(
                    booking_id = %booking.id,
                    db_error = ?err,
                    "payments: failed to record card intent"
                );
                PaymentError::Internal(err)
            })?;

        self.booking_repo
            .mark_payment(
                booking.id,
                PaymentMethod::Card,
                BookingStatus::PendingPayment,
                None,
            )
            .await
            .map_err(|err| {
                error!(
                    booking_id = %booking.id,
                    db_error = ?err,
                    "payments: failed to mark booking for card payment"
                );
                PaymentError::Internal(err)
            })?;

        info!(
            booking_id = %booking.id,
            %intent_id,
            preference_id = %checkout.preference_id,
            "payments: card checkout created"
        );

        Ok(PaymentResult {
            booking_id: booking.id,
            booking_status: BookingStatus::PendingPayment.to_string(),
            payment_method: PaymentMethod::Card.to_string(),
            intent_id: Some(intent_id),
            redirect_url: Some(checkout.redirect_url),
            wallet_amount_usd: None,
            card_amount_usd: Some(amount_usd),
        })
    }

    async fn process_partial_payment(
        &self,
        booking: &BookingEntity,
        params: &BookingPaymentParams,
    ) -> UseCaseResult<PaymentResult> {
        let wallet_amount_usd = params.wallet_amount_usd.ok_or_else(|| {
            PaymentError::InvalidRequest("wallet_amount_usd is required for partial_wallet".into())
        })?;
        let card_amount_usd = params.card_amount_usd.ok_or_else(|| {
            PaymentError::InvalidRequest("card_amount_usd is required for partial_wallet".into())
        })?;

        if wallet_amount_usd <= 0.0 || card_amount_usd <= 0.0 {
            let err = PaymentError::InvalidRequest(
                "wallet and card amounts must both be positive".into(),
            );
            warn!(
                booking_id = %booking.id,
                wallet_amount_usd,
                card_amount_usd,
                status = err.status_code().as_u16(),
                "payments: rejected non-positive split amounts"
            );
            return Err(err);
        }

        if (round2(wallet_amount_usd + card_amount_usd) - round2(booking.total_amount_usd)).abs()
            > AMOUNT_TOLERANCE_USD
        {
            let err = PaymentError::InvalidRequest(
                "wallet and card amounts do not add up to the booking total".into(),
            );
            warn!(
                booking_id = %booking.id,
                wallet_amount_usd,
                card_amount_usd,
                total_amount_usd = booking.total_amount_usd,
                status = err.status_code().as_u16(),
                "payments: rejected split that does not cover the total"
            );
            return Err(err);
        }

        let fx_rate = self.current_fx_rate(booking.id).await?;

        match self
            .wallet_repo
            .lock_funds(
                booking.renter_id,
                booking.id,
                wallet_amount_usd,
                "partial wallet payment",
            )
            .await
            .map_err(|err| {
                error!(
                    booking_id = %booking.id,
                    db_error = ?err,
                    "payments: wallet lock failed for partial payment"
                );
                PaymentError::Internal(err)
            })? {
            LockOutcome::Locked(receipt) => {
                info!(
                    booking_id = %booking.id,
                    lock_id = %receipt.lock_id,
                    wallet_amount_usd,
                    "payments: partial wallet funds locked"
                );
            }
            LockOutcome::InsufficientFunds {
                available_usd,
                requested_usd,
            } => {
                let err = PaymentError::InsufficientFunds {
                    available_usd,
                    requested_usd,
                };
                warn!(
                    booking_id = %booking.id,
                    available_usd,
                    requested_usd,
                    status = err.status_code().as_u16(),
                    "payments: insufficient wallet funds for partial payment"
                );
                return Err(err);
            }
        }

        // Everything after the lock compensates with a single unlock on
        // failure; the unlock itself never escalates.
        let amount_ars = round2(card_amount_usd * fx_rate);
        let checkout = match self
            .provider
            .create_checkout(booking.id, amount_ars, &format!("Booking {}", booking.id))
            .await
        {
            Ok(checkout) => checkout,
            Err(err) => {
                error!(
                    booking_id = %booking.id,
                    error = ?err,
                    "payments: provider checkout failed after wallet lock, compensating"
                );
                self.compensate_unlock(booking.id).await;
                return Err(PaymentError::Internal(err));
            }
        };

        let intent_id = match self
            .intent_repo
            .create(NewPaymentIntentEntity {
                booking_id: booking.id,
                provider: PROVIDER_NAME.to_string(),
                provider_payment_id: None,
                method: PaymentMethod::PartialWallet.to_string(),
                status: PaymentIntentStatus::Pending.to_string(),
                amount_usd: card_amount_usd,
                amount_ars,
                fx_rate,
                commission_fee_usd: None,
                redirect_url: Some(checkout.redirect_url.clone()),
                rejection_reason: None,
            })
            .await
        {
            Ok(intent_id) => intent_id,
            Err(err) => {
                error!(
                    booking_id = %booking.id,
                    db_error = ?err,
                    "payments: failed to record partial intent after wallet lock, compensating"
                );
                self.compensate_unlock(booking.id).await;
                return Err(PaymentError::Internal(err));
            }
        };

        if let Err(err) = self
            .booking_repo
            .mark_payment(
                booking.id,
                PaymentMethod::PartialWallet,
                BookingStatus::PendingPayment,
                Some(usd_to_cents(wallet_amount_usd)),
            )
            .await
        {
            error!(
                booking_id = %booking.id,
                db_error = ?err,
                "payments: failed to mark booking for partial payment, compensating"
            );
            self.compensate_unlock(booking.id).await;
            return Err(PaymentError::Internal(err));
        }

        info!(
            booking_id = %booking.id,
            %intent_id,
            wallet_amount_usd,
            card_amount_usd,
            "payments: partial payment initiated"
        );

        Ok(PaymentResult {
            booking_id: booking.id,
            booking_status: BookingStatus::PendingPayment.to_string(),
            payment_method: PaymentMethod::PartialWallet.to_string(),
            intent_id: Some(intent_id),
            redirect_url: Some(checkout.redirect_url),
            wallet_amount_usd: Some(wallet_amount_usd),
            card_amount_usd: Some(card_amount_usd),
        })
    }

    /// Handles a provider webhook delivery. Malformed payloads are rejected
    /// outright; processing failures are parked in the dead-letter queue and
    /// reported as errors so the provider retries.
    pub async fn handle_payment_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> UseCaseResult<()> {
        self.provider
            .verify_webhook_signature(payload, signature_header)
            .map_err(|err| {
                warn!(error = %err, "payments: webhook signature verification failed");
                PaymentError::InvalidWebhook("signature verification failed".into())
            })?;

        let webhook: PaymentWebhookPayload = serde_json::from_slice(payload).map_err(|err| {
            warn!(error = %err, "payments: malformed webhook payload");
            PaymentError::InvalidWebhook("malformed payload".into())
        })?;

        info!(
            booking_id = %webhook.booking_id,
            webhook_status = %webhook.status,
            provider_payment_id = ?webhook.provider_payment_id,
            "payments: webhook received"
        );

        match self.apply_webhook(&webhook).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.park_webhook_in_dlq(&webhook, &err).await;
                Err(PaymentError::Internal(err))
            }
        }
    }

    async fn apply_webhook(&self, webhook: &PaymentWebhookPayload) -> anyhow::Result<()> {
        if webhook.is_approved() {
            self.settlement
                .apply_approved_payment(webhook.booking_id, webhook.provider_payment_id.clone())
                .await?;
            return Ok(());
        }

        if webhook.is_rejected() {
            let reason = webhook
                .status_detail
                .as_deref()
                .map(rejection_message)
                .unwrap_or("The payment was declined, try another payment method");

            if let Some(intent) = self
                .intent_repo
                .find_by_booking_id(webhook.booking_id)
                .await?
                .into_iter()
                .find(|intent| intent.status == PaymentIntentStatus::Pending.to_string())
            {
                self.intent_repo
                    .mark_failed(intent.id, reason.to_string())
                    .await?;
            }

            let cancelled = self
                .booking_repo
                .transition_status(
                    webhook.booking_id,
                    BookingStatus::PendingPayment,
                    BookingStatus::Cancelled,
                )
                .await?;

            // The unlock is idempotent, so a re-delivered rejection simply
            // reports NoActiveLock.
            let unlock = self.wallet_repo.unlock_funds(webhook.booking_id).await?;
            info!(
                booking_id = %webhook.booking_id,
                cancelled,
                unlocked = matches!(unlock, UnlockOutcome::Released { .. }),
                "payments: rejected payment processed"
            );
            return Ok(());
        }

        info!(
            booking_id = %webhook.booking_id,
            webhook_status = %webhook.status,
            "payments: webhook status requires no action"
        );
        Ok(())
    }

    async fn park_webhook_in_dlq(&self, webhook: &PaymentWebhookPayload, err: &anyhow::Error) {
        let payload = match serde_json::to_value(webhook) {
            Ok(value) => value,
            Err(serialize_err) => {
                error!(
                    booking_id = %webhook.booking_id,
                    error = %serialize_err,
                    "payments: failed to serialize webhook for the dead-letter queue"
                );
                return;
            }
        };

        let item = NewDlqItemEntity {
            event_type: DlqEventType::Payment.to_string(),
            payload,
            error_message: Some(err.to_string()),
            retry_count: 0,
            max_retries: DLQ_DEFAULT_MAX_RETRIES,
            status: DlqStatus::Pending.to_string(),
            next_retry_at: Utc::now(),
        };

        match self.dlq_repo.enqueue(item).await {
            Ok(item_id) => {
                warn!(
                    booking_id = %webhook.booking_id,
                    dlq_item_id = %item_id,
                    error = %err,
                    "payments: webhook processing failed, parked in dead-letter queue"
                );
            }
            Err(enqueue_err) => {
                error!(
                    booking_id = %webhook.booking_id,
                    error = %err,
                    dlq_error = ?enqueue_err,
                    "payments: failed to park webhook in the dead-letter queue"
                );
            }
        }
    }

    pub async fn process_refund(&self, params: RefundParams) -> UseCaseResult<RefundResult> {
        let booking = self.load_booking(params.booking_id).await?;

        if booking.status == BookingStatus::PendingPayment.to_string() {
            let err = PaymentError::InvalidRequest("booking has not been paid".into());
            warn!(
                booking_id = %booking.id,
                status = err.status_code().as_u16(),
                "payments: refund requested for unpaid booking"
            );
            return Err(err);
        }

        let total_usd = booking.total_amount_usd;
        // Partial refunds are a flat 50% until cancellation-policy tiers ship.
        let refund_usd = if params.full {
            total_usd
        } else {
            round2(total_usd * PARTIAL_REFUND_RATE)
        };

        let wallet_paid_usd = cents_to_usd(booking.wallet_amount_cents.unwrap_or(0));
        let wallet_refund_usd = if total_usd > 0.0 {
            round2(refund_usd * wallet_paid_usd / total_usd).min(refund_usd)
        } else {
            0.0
        };
        let card_refund_usd = round2(refund_usd - wallet_refund_usd);

        if wallet_refund_usd > 0.0 {
            self.wallet_repo
                .credit(
                    booking.renter_id,
                    Some(booking.id),
                    LedgerEntryKind::Refund,
                    wallet_refund_usd,
                    Some("booking refund".to_string()),
                )
                .await
                .map_err(|err| {
                    error!(
                        booking_id = %booking.id,
                        db_error = ?err,
                        "payments: wallet refund credit failed"
                    );
                    PaymentError::Internal(err)
                })?;
        }

        let mut provider_refund_id = None;
        if card_refund_usd > 0.0 {
            let intent = self
                .intent_repo
                .find_by_booking_id(booking.id)
                .await
                .map_err(PaymentError::Internal)?
                .into_iter()
                .find(|intent| {
                    intent.status == PaymentIntentStatus::Completed.to_string()
                        && intent.provider_payment_id.is_some()
                })
                .ok_or_else(|| {
                    PaymentError::Internal(anyhow!(
                        "no completed provider payment found to refund"
                    ))
                })?;

            let provider_payment_id = intent
                .provider_payment_id
                .as_deref()
                .ok_or_else(|| PaymentError::Internal(anyhow!("intent missing provider id")))?;

            let refund = self
                .provider
                .refund_payment(
                    provider_payment_id,
                    Some(round2(card_refund_usd * intent.fx_rate)),
                )
                .await
                .map_err(|err| {
                    error!(
                        booking_id = %booking.id,
                        provider_payment_id,
                        error = ?err,
                        "payments: provider refund failed"
                    );
                    PaymentError::Internal(err)
                })?;
            provider_refund_id = Some(refund.id);
        }

        info!(
            booking_id = %booking.id,
            refund_usd,
            wallet_refund_usd,
            card_refund_usd,
            full = params.full,
            "payments: refund processed"
        );

        Ok(RefundResult {
            booking_id: booking.id,
            amount_usd: refund_usd,
            wallet_refund_usd,
            card_refund_usd,
            provider_refund_id,
        })
    }

    async fn load_booking(&self, booking_id: Uuid) -> UseCaseResult<BookingEntity> {
        self.booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "payments: failed to load booking");
                PaymentError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = PaymentError::BookingNotFound;
                warn!(
                    %booking_id,
                    status = err.status_code().as_u16(),
                    "payments: booking not found"
                );
                err
            })
    }

    async fn current_fx_rate(&self, booking_id: Uuid) -> UseCaseResult<f64> {
        self.fx_provider
            .get_current_rate("USD", "ARS")
            .await
            .map_err(|err| {
                error!(%booking_id, error = ?err, "payments: failed to fetch fx rate");
                PaymentError::Internal(err)
            })
    }

    /// Best effort: a failed compensation is logged and never escalated so
    /// the original error reaches the caller unchanged.
    async fn compensate_unlock(&self, booking_id: Uuid) {
        match self.wallet_repo.unlock_funds(booking_id).await {
            Ok(UnlockOutcome::Released { amount_usd }) => {
                info!(%booking_id, amount_usd, "payments: compensating unlock released funds");
            }
            Ok(UnlockOutcome::NoActiveLock) => {
                info!(%booking_id, "payments: compensating unlock found no active lock");
            }
            Err(err) => {
                error!(
                    %booking_id,
                    db_error = ?err,
                    "payments: compensating unlock failed, funds stay locked for review"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::gateways::{MockFxRateProvider, MockPaymentProviderGateway};
    use crate::domain::repositories::{
        bookings::MockBookingRepository, dlq::MockDlqRepository,
        payment_intents::MockPaymentIntentRepository, wallets::MockWalletRepository,
    };
    use crate::domain::value_objects::provider::{ProviderCheckout, ProviderRefund};
    use crate::domain::value_objects::wallet::LockFundsReceipt;
    use crate::domain::entities::payment_intents::PaymentIntentEntity;
    use mockall::predicate::eq;

    fn booking(id: Uuid, status: &str, total: f64, wallet_cents: Option<i64>) -> BookingEntity {
        let now = Utc::now();
        BookingEntity {
            id,
            renter_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            status: status.to_string(),
            payment_method: None,
            total_amount_usd: total,
            currency: "USD".to_string(),
            wallet_amount_cents: wallet_cents,
            created_at: now,
            updated_at: now,
        }
    }

    fn completed_card_intent(booking_id: Uuid) -> PaymentIntentEntity {
        let now = Utc::now();
        PaymentIntentEntity {
            id: Uuid::new_v4(),
            booking_id,
            provider: "mercadopago".to_string(),
            provider_payment_id: Some("mp-77".to_string()),
            method: "card".to_string(),
            status: "completed".to_string(),
            amount_usd: 500.0,
            amount_ars: 500_000.0,
            fx_rate: 1000.0,
            commission_fee_usd: Some(75.0),
            redirect_url: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    struct Mocks {
        booking_repo: MockBookingRepository,
        intent_repo: MockPaymentIntentRepository,
        wallet_repo: MockWalletRepository,
        dlq_repo: MockDlqRepository,
        provider: MockPaymentProviderGateway,
        fx_provider: MockFxRateProvider,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                booking_repo: MockBookingRepository::new(),
                intent_repo: MockPaymentIntentRepository::new(),
                wallet_repo: MockWalletRepository::new(),
                dlq_repo: MockDlqRepository::new(),
                provider: MockPaymentProviderGateway::new(),
                fx_provider: MockFxRateProvider::new(),
            }
        }

        fn build(
            self,
        ) -> PaymentOrchestrator<
            MockBookingRepository,
            MockPaymentIntentRepository,
            MockWalletRepository,
            MockDlqRepository,
            MockPaymentProviderGateway,
            MockFxRateProvider,
        > {
            PaymentOrchestrator::new(
                Arc::new(self.booking_repo),
                Arc::new(self.intent_repo),
                Arc::new(self.wallet_repo),
                Arc::new(self.dlq_repo),
                Arc::new(self.provider),
                Arc::new(self.fx_provider),
            )
        }
    }

    fn expect_booking(mocks: &mut Mocks, entity: BookingEntity) {
        let id = entity.id;
        mocks
            .booking_repo
            .expect_find_by_id()
            .with(eq(id))
            .returning(move |_| {
                let entity = entity.clone();
                Box::pin(async move { Ok(Some(entity)) })
            });
    }

    fn expect_fx_rate(mocks: &mut Mocks, rate: f64) {
        mocks
            .fx_provider
            .expect_get_current_rate()
            .returning(move |_, _| Box::pin(async move { Ok(rate) }));
    }

    #[tokio::test]
    async fn wallet_payment_locks_confirms_and_records_intent() {
        let booking_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        expect_booking(&mut mocks, booking(booking_id, "pending_payment", 500.0, None));
        expect_fx_rate(&mut mocks, 1000.0);

        mocks
            .wallet_repo
            .expect_lock_funds()
            .withf(move |_, bid, _, reason| *bid == booking_id && reason == "wallet payment")
            .times(1)
            .returning(|_, _, amount, _| {
                Box::pin(async move {
                    Ok(LockOutcome::Locked(LockFundsReceipt {
                        lock_id: Uuid::new_v4(),
                        amount_usd: amount,
                    }))
                })
            });
        mocks
            .booking_repo
            .expect_mark_payment()
            .with(
                eq(booking_id),
                eq(PaymentMethod::Wallet),
                eq(BookingStatus::Confirmed),
                eq(Some(50_000_i64)),
            )
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(()) }));
        mocks
            .intent_repo
            .expect_create()
            .withf(|intent| {
                intent.provider == "wallet"
                    && intent.status == "completed"
                    && intent.amount_usd == 500.0
                    && intent.amount_ars == 500_000.0
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let orchestrator = mocks.build();
        let result = orchestrator
            .process_booking_payment(BookingPaymentParams {
                booking_id,
                payment_method: "wallet".to_string(),
                wallet_amount_usd: None,
                card_amount_usd: None,
            })
            .await
            .unwrap();

        assert_eq!(result.booking_status, "confirmed");
        assert_eq!(result.wallet_amount_usd, Some(500.0));
        assert!(result.redirect_url.is_none());
    }

    #[tokio::test]
    async fn unknown_method_fails_before_any_side_effect() {
        // No expectations are registered: any repository or provider call
        // would panic the test.
        let orchestrator = Mocks::new().build();

        let err = orchestrator
            .process_booking_payment(BookingPaymentParams {
                booking_id: Uuid::new_v4(),
                payment_method: "crypto".to_string(),
                wallet_amount_usd: None,
                card_amount_usd: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::InvalidRequest(_)));
        assert_eq!(err.status_code().as_u16(), 400);
    }

    #[tokio::test]
    async fn insufficient_wallet_funds_map_to_payment_required() {
        let booking_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        expect_booking(&mut mocks, booking(booking_id, "pending_payment", 500.0, None));
        expect_fx_rate(&mut mocks, 1000.0);
        mocks.wallet_repo.expect_lock_funds().returning(|_, _, _, _| {
            Box::pin(async {
                Ok(LockOutcome::InsufficientFunds {
                    available_usd: 100.0,
                    requested_usd: 500.0,
                })
            })
        });

        let orchestrator = mocks.build();
        let err = orchestrator
            .process_booking_payment(BookingPaymentParams {
                booking_id,
                payment_method: "wallet".to_string(),
                wallet_amount_usd: None,
                card_amount_usd: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::InsufficientFunds { .. }));
        assert_eq!(err.status_code().as_u16(), 402);
    }

    #[tokio::test]
    async fn partial_split_must_cover_the_total() {
        let booking_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        expect_booking(&mut mocks, booking(booking_id, "pending_payment", 500.0, None));

        // No wallet/provider expectations: validation must fail first.
        let orchestrator = mocks.build();
        let err = orchestrator
            .process_booking_payment(BookingPaymentParams {
                booking_id,
                payment_method: "partial_wallet".to_string(),
                wallet_amount_usd: Some(100.0),
                card_amount_usd: Some(200.0),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn partial_post_lock_failure_unlocks_exactly_once() {
        let booking_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        expect_booking(&mut mocks, booking(booking_id, "pending_payment", 500.0, None));
        expect_fx_rate(&mut mocks, 1000.0);

        mocks.wallet_repo.expect_lock_funds().returning(|_, _, amount, _| {
            Box::pin(async move {
                Ok(LockOutcome::Locked(LockFundsReceipt {
                    lock_id: Uuid::new_v4(),
                    amount_usd: amount,
                }))
            })
        });
        mocks
            .provider
            .expect_create_checkout()
            .returning(|_, _, _| Box::pin(async { Err(anyhow!("provider down")) }));
        mocks
            .wallet_repo
            .expect_unlock_funds()
            .with(eq(booking_id))
            .times(1)
            .returning(|_| Box::pin(async { Ok(UnlockOutcome::Released { amount_usd: 100.0 }) }));

        let orchestrator = mocks.build();
        let err = orchestrator
            .process_booking_payment(BookingPaymentParams {
                booking_id,
                payment_method: "partial_wallet".to_string(),
                wallet_amount_usd: Some(100.0),
                card_amount_usd: Some(400.0),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Internal(_)));
    }

    #[tokio::test]
    async fn partial_payment_records_split_and_redirect() {
        let booking_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        expect_booking(&mut mocks, booking(booking_id, "pending_payment", 500.0, None));
        expect_fx_rate(&mut mocks, 1000.0);

        mocks.wallet_repo.expect_lock_funds().returning(|_, _, amount, _| {
            Box::pin(async move {
                Ok(LockOutcome::Locked(LockFundsReceipt {
                    lock_id: Uuid::new_v4(),
                    amount_usd: amount,
                }))
            })
        });
        mocks.provider.expect_create_checkout().returning(|_, _, _| {
            Box::pin(async {
                Ok(ProviderCheckout {
                    preference_id: "pref-1".to_string(),
                    redirect_url: "https://provider.example/checkout/pref-1".to_string(),
                })
            })
        });
        mocks
            .intent_repo
            .expect_create()
            .withf(|intent| {
                intent.method == "partial_wallet"
                    && intent.amount_usd == 400.0
                    && intent.amount_ars == 400_000.0
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));
        mocks
            .booking_repo
            .expect_mark_payment()
            .with(
                eq(booking_id),
                eq(PaymentMethod::PartialWallet),
                eq(BookingStatus::PendingPayment),
                eq(Some(10_000_i64)),
            )
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(()) }));

        let orchestrator = mocks.build();
        let result = orchestrator
            .process_booking_payment(BookingPaymentParams {
                booking_id,
                payment_method: "partial_wallet".to_string(),
                wallet_amount_usd: Some(100.0),
                card_amount_usd: Some(400.0),
            })
            .await
            .unwrap();

        assert_eq!(result.booking_status, "pending_payment");
        assert_eq!(result.wallet_amount_usd, Some(100.0));
        assert_eq!(result.card_amount_usd, Some(400.0));
        assert!(result.redirect_url.is_some());
    }

    fn webhook_body(booking_id: Uuid, status: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "booking_id": booking_id,
            "provider_payment_id": "mp-1",
            "status": status,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn approved_webhook_settles_the_booking() {
        let booking_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        mocks
            .provider
            .expect_verify_webhook_signature()
            .returning(|_, _| Ok(()));
        mocks
            .intent_repo
            .expect_find_by_provider_payment_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        mocks
            .intent_repo
            .expect_find_by_booking_id()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .booking_repo
            .expect_transition_status()
            .with(
                eq(booking_id),
                eq(BookingStatus::PendingPayment),
                eq(BookingStatus::Confirmed),
            )
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(true) }));

        let orchestrator = mocks.build();
        orchestrator
            .handle_payment_webhook(&webhook_body(booking_id, "approved"), "t=1,v1=ok")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn redelivered_webhook_is_idempotent() {
        let booking_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        mocks
            .provider
            .expect_verify_webhook_signature()
            .returning(|_, _| Ok(()));
        mocks
            .intent_repo
            .expect_find_by_provider_payment_id()
            .times(2)
            .returning(|_| Box::pin(async { Ok(None) }));
        mocks
            .intent_repo
            .expect_find_by_booking_id()
            .times(2)
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        // The guard rejects the second transition; both deliveries succeed.
        mocks
            .booking_repo
            .expect_transition_status()
            .times(2)
            .returning(|_, _, _| Box::pin(async { Ok(false) }));

        let orchestrator = mocks.build();
        let body = webhook_body(booking_id, "approved");
        orchestrator
            .handle_payment_webhook(&body, "t=1,v1=ok")
            .await
            .unwrap();
        orchestrator
            .handle_payment_webhook(&body, "t=1,v1=ok")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_webhook_cancels_and_unlocks() {
        let booking_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        mocks
            .provider
            .expect_verify_webhook_signature()
            .returning(|_, _| Ok(()));
        mocks
            .intent_repo
            .expect_find_by_booking_id()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .booking_repo
            .expect_transition_status()
            .with(
                eq(booking_id),
                eq(BookingStatus::PendingPayment),
                eq(BookingStatus::Cancelled),
            )
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(true) }));
        mocks
            .wallet_repo
            .expect_unlock_funds()
            .with(eq(booking_id))
            .times(1)
            .returning(|_| Box::pin(async { Ok(UnlockOutcome::Released { amount_usd: 100.0 }) }));

        let orchestrator = mocks.build();
        orchestrator
            .handle_payment_webhook(&webhook_body(booking_id, "rejected"), "t=1,v1=ok")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn malformed_webhook_is_rejected_without_dlq() {
        let mut mocks = Mocks::new();
        mocks
            .provider
            .expect_verify_webhook_signature()
            .returning(|_, _| Ok(()));
        // No dlq expectation: a malformed payload never reaches the queue.

        let orchestrator = mocks.build();
        let err = orchestrator
            .handle_payment_webhook(br#"{"status": "approved"}"#, "t=1,v1=ok")
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::InvalidWebhook(_)));
    }

    #[tokio::test]
    async fn webhook_processing_failure_is_parked_in_the_dlq() {
        let booking_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        mocks
            .provider
            .expect_verify_webhook_signature()
            .returning(|_, _| Ok(()));
        mocks
            .intent_repo
            .expect_find_by_provider_payment_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        mocks
            .intent_repo
            .expect_find_by_booking_id()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        mocks
            .booking_repo
            .expect_transition_status()
            .returning(|_, _, _| Box::pin(async { Err(anyhow!("db unavailable")) }));
        mocks
            .dlq_repo
            .expect_enqueue()
            .withf(|item| item.event_type == "payment" && item.status == "pending")
            .times(1)
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let orchestrator = mocks.build();
        let err = orchestrator
            .handle_payment_webhook(&webhook_body(booking_id, "approved"), "t=1,v1=ok")
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Internal(_)));
    }

    #[tokio::test]
    async fn full_refund_returns_the_total() {
        let booking_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        // Wallet-paid booking: the whole refund goes back to the wallet.
        expect_booking(
            &mut mocks,
            booking(booking_id, "confirmed", 500.0, Some(50_000)),
        );
        mocks
            .wallet_repo
            .expect_credit()
            .withf(|_, _, kind, amount, _| {
                *kind == LedgerEntryKind::Refund && *amount == 500.0
            })
            .times(1)
            .returning(|_, _, _, _, _| Box::pin(async { Ok(()) }));

        let orchestrator = mocks.build();
        let result = orchestrator
            .process_refund(RefundParams {
                booking_id,
                full: true,
            })
            .await
            .unwrap();

        assert_eq!(result.amount_usd, 500.0);
        assert_eq!(result.wallet_refund_usd, 500.0);
        assert_eq!(result.card_refund_usd, 0.0);
    }

    #[tokio::test]
    async fn partial_refund_is_half_of_the_total() {
        let booking_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        expect_booking(&mut mocks, booking(booking_id, "confirmed", 500.0, None));
        mocks
            .intent_repo
            .expect_find_by_booking_id()
            .returning(move |_| {
                let intent = completed_card_intent(booking_id);
                Box::pin(async move { Ok(vec![intent]) })
            });
        mocks
            .provider
            .expect_refund_payment()
            .with(eq("mp-77"), eq(Some(250_000.0)))
            .times(1)
            .returning(|_, _| {
                Box::pin(async {
                    Ok(ProviderRefund {
                        id: "refund-1".to_string(),
                    })
                })
            });

        let orchestrator = mocks.build();
        let result = orchestrator
            .process_refund(RefundParams {
                booking_id,
                full: false,
            })
            .await
            .unwrap();

        assert_eq!(result.amount_usd, 250.0);
        assert_eq!(result.card_refund_usd, 250.0);
        assert_eq!(result.provider_refund_id, Some("refund-1".to_string()));
    }
}
