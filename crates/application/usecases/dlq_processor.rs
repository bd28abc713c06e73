use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        gateways::{AlertSink, PaymentProviderGateway},
        usecases::settlement::SettlementService,
    },
    domain::{
        entities::dlq_items::DlqItemEntity,
        repositories::{
            bookings::BookingRepository, dlq::DlqRepository,
            payment_intents::PaymentIntentRepository,
        },
        value_objects::{
            alerts::{AlertPayload, AlertSeverity},
            dlq::DlqSweepSummary,
            enums::dlq_event_types::DlqEventType,
            payments::PaymentWebhookPayload,
        },
    },
};

pub const MAX_ITEMS_PER_RUN: i64 = 10;

/// How long a claimed item stays invisible to other sweeps while its
/// dispatch runs.
const CLAIM_LEASE_MINUTES: i64 = 10;

/// Backoff before attempt `retry_count + 1`: 10, 20, 40, 80, 160 minutes.
pub fn next_retry_delay(retry_count: i32) -> Duration {
    Duration::minutes(5 * 2_i64.pow((retry_count + 1) as u32))
}

#[derive(Debug, Deserialize)]
struct MerchantOrderEvent {
    order_id: String,
}

#[derive(Debug, Deserialize)]
struct PreapprovalEvent {
    preapproval_id: String,
}

/// Drains due dead-letter items by re-querying the provider for the current
/// state of each event and settling whatever turns out approved.
pub struct DlqProcessor<D, B, I, G, A>
where
    D: DlqRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    I: PaymentIntentRepository + Send + Sync + 'static,
    G: PaymentProviderGateway + Send + Sync + 'static,
    A: AlertSink + Send + Sync + 'static,
{
    dlq_repo: Arc<D>,
    provider: Arc<G>,
    alerts: Arc<A>,
    settlement: SettlementService<B, I>,
}

impl<D, B, I, G, A> DlqProcessor<D, B, I, G, A>
where
    D: DlqRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    I: PaymentIntentRepository + Send + Sync + 'static,
    G: PaymentProviderGateway + Send + Sync + 'static,
    A: AlertSink + Send + Sync + 'static,
{
    pub fn new(
        dlq_repo: Arc<D>,
        booking_repo: Arc<B>,
        intent_repo: Arc<I>,
        provider: Arc<G>,
        alerts: Arc<A>,
    ) -> Self {
        Self {
            dlq_repo,
            provider,
            alerts,
            settlement: SettlementService::new(booking_repo, intent_repo),
        }
    }

    /// One sweep over the queue, bounded to `MAX_ITEMS_PER_RUN` items so a
    /// deep backlog never monopolizes the worker.
    pub async fn process_due_items(&self) -> Result<DlqSweepSummary> {
        let now = Utc::now();
        let due = self.dlq_repo.list_due(now, MAX_ITEMS_PER_RUN).await?;
        let mut summary = DlqSweepSummary::default();

        for item in due {
            // The worker loop and the manual sweep endpoint can race between
            // the listing and here; the claim is the tiebreaker, so an item
            // is only ever dispatched by one sweep.
            let claimed = self
                .dlq_repo
                .claim(item.id, now, now + Duration::minutes(CLAIM_LEASE_MINUTES))
                .await?;
            if !claimed {
                continue;
            }

            summary.processed += 1;
            match self.process_item(&item).await {
                Ok(()) => {
                    self.dlq_repo.mark_resolved(item.id).await?;
                    summary.resolved += 1;
                    info!(item_id = %item.id, event_type = %item.event_type, "dlq: item resolved");
                }
                Err(err) => {
                    if item.retry_count + 1 >= item.max_retries {
                        self.dlq_repo.mark_failed(item.id, err.to_string()).await?;
                        summary.failed += 1;
                        self.alert_permanent_failure(&item, &err).await;
                    } else {
                        let next_retry_at = Utc::now() + next_retry_delay(item.retry_count);
                        self.dlq_repo
                            .schedule_retry(item.id, err.to_string(), next_retry_at)
                            .await?;
                        summary.retrying += 1;
                        warn!(
                            item_id = %item.id,
                            event_type = %item.event_type,
                            retry_count = item.retry_count + 1,
                            %next_retry_at,
                            error = %err,
                            "dlq: item rescheduled"
                        );
                    }
                }
            }
        }

        if summary.processed > 0 {
            info!(
                processed = summary.processed,
                resolved = summary.resolved,
                retrying = summary.retrying,
                failed = summary.failed,
                "dlq: sweep finished"
            );
        }
        Ok(summary)
    }

    async fn process_item(&self, item: &DlqItemEntity) -> Result<()> {
        let event_type = DlqEventType::from_str(&item.event_type)
            .ok_or_else(|| anyhow!("unknown dead-letter event type: {}", item.event_type))?;

        match event_type {
            DlqEventType::Payment => self.process_payment_event(item).await,
            DlqEventType::MerchantOrder => self.process_merchant_order_event(item).await,
            DlqEventType::Preapproval => self.process_preapproval_event(item).await,
        }
    }

    async fn process_payment_event(&self, item: &DlqItemEntity) -> Result<()> {
        let webhook: PaymentWebhookPayload = serde_json::from_value(item.payload.clone())
            .context("malformed payment payload in dead-letter item")?;

        // The stored status is stale by now; ask the provider what actually
        // happened to the payment.
        let payment = match webhook.provider_payment_id.as_deref() {
            Some(payment_id) => Some(self.provider.get_payment(payment_id).await?),
            None => self
                .provider
                .search_payments_by_booking_id(webhook.booking_id)
                .await?
                .into_iter()
                .find(|payment| payment.is_approved()),
        };

        match payment {
            Some(payment) if payment.is_approved() => {
                self.settlement
                    .apply_approved_payment(webhook.booking_id, Some(payment.id))
                    .await?;
                Ok(())
            }
            Some(payment) if payment.is_rejected() => {
                // Nothing left to do; the rejection flow already ran (or
                // will) through the webhook path.
                info!(
                    booking_id = %webhook.booking_id,
                    provider_payment_id = %payment.id,
                    "dlq: payment is rejected at the provider, resolving item"
                );
                Ok(())
            }
            Some(payment) => Err(anyhow!(
                "payment {} still in state {} at the provider",
                payment.id,
                payment.status
            )),
            None => Err(anyhow!(
                "no approved provider payment found for booking {}",
                webhook.booking_id
            )),
        }
    }

    async fn process_merchant_order_event(&self, item: &DlqItemEntity) -> Result<()> {
        let event: MerchantOrderEvent = serde_json::from_value(item.payload.clone())
            .context("malformed merchant order payload in dead-letter item")?;

        let order = self.provider.get_merchant_order(&event.order_id).await?;
        if !order.is_fully_paid() {
            return Err(anyhow!(
                "merchant order {} not fully paid: {} of {}",
                order.id,
                order.paid_amount,
                order.total_amount
            ));
        }

        for payment in order.payments.iter().filter(|payment| payment.is_approved()) {
            let booking_id = payment
                .external_reference
                .as_deref()
                .and_then(|reference| Uuid::parse_str(reference).ok())
                .ok_or_else(|| {
                    anyhow!(
                        "approved payment {} in order {} carries no booking reference",
                        payment.id,
                        order.id
                    )
                })?;
            self.settlement
                .apply_approved_payment(booking_id, Some(payment.id.clone()))
                .await?;
        }
        Ok(())
    }

    async fn process_preapproval_event(&self, item: &DlqItemEntity) -> Result<()> {
        let event: PreapprovalEvent = serde_json::from_value(item.payload.clone())
            .context("malformed preapproval payload in dead-letter item")?;

        let preapproval = self.provider.get_preapproval(&event.preapproval_id).await?;
        if !preapproval.is_authorized() {
            return Err(anyhow!(
                "preapproval {} still in state {}",
                preapproval.id,
                preapproval.status
            ));
        }

        info!(
            preapproval_id = %preapproval.id,
            "dlq: preapproval authorized, resolving item"
        );
        Ok(())
    }

    async fn alert_permanent_failure(&self, item: &DlqItemEntity, err: &anyhow::Error) {
        error!(
            item_id = %item.id,
            event_type = %item.event_type,
            retry_count = item.retry_count + 1,
            error = %err,
            "dlq: item exhausted its retries"
        );

        let alert = AlertPayload::new(
            AlertSeverity::Critical,
            "dlq_processor",
            &item.event_type,
            format!("dead-letter item {} exhausted its retries", item.id),
            serde_json::json!({
                "item_id": item.id,
                "event_type": item.event_type,
                "retry_count": item.retry_count + 1,
                "last_error": err.to_string(),
            }),
        );

        if let Err(alert_err) = self.alerts.send(alert).await {
            error!(
                item_id = %item.id,
                error = ?alert_err,
                "dlq: failed to send permanent failure alert"
            );
        }
    }
}
