use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    repositories::{bookings::BookingRepository, payment_intents::PaymentIntentRepository},
    value_objects::enums::{
        booking_statuses::BookingStatus, payment_intent_statuses::PaymentIntentStatus,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementOutcome {
    pub intent_completed: bool,
    pub booking_confirmed: bool,
}

/// The one place an approved provider payment is applied to our records.
/// The webhook path, the dead-letter processor and the reconciliation sweep
/// all go through here so a payment settles identically no matter which
/// delivery channel won the race.
pub struct SettlementService<B, I>
where
    B: BookingRepository + Send + Sync + 'static,
    I: PaymentIntentRepository + Send + Sync + 'static,
{
    booking_repo: Arc<B>,
    intent_repo: Arc<I>,
}

impl<B, I> SettlementService<B, I>
where
    B: BookingRepository + Send + Sync + 'static,
    I: PaymentIntentRepository + Send + Sync + 'static,
{
    pub fn new(booking_repo: Arc<B>, intent_repo: Arc<I>) -> Self {
        Self {
            booking_repo,
            intent_repo,
        }
    }

    /// Completes the matching intent and confirms the booking. Both updates
    /// are status-guarded, so re-delivery of an already settled payment is a
    /// no-op rather than an error.
    pub async fn apply_approved_payment(
        &self,
        booking_id: Uuid,
        provider_payment_id: Option<String>,
    ) -> Result<SettlementOutcome> {
        let mut intent = match provider_payment_id.as_deref() {
            Some(payment_id) => {
                self.intent_repo
                    .find_by_provider_payment_id(payment_id)
                    .await?
            }
            None => None,
        };

        if intent.is_none() {
            intent = self
                .intent_repo
                .find_by_booking_id(booking_id)
                .await?
                .into_iter()
                .find(|candidate| candidate.status == PaymentIntentStatus::Pending.to_string());
        }

        let intent_completed = match intent {
            Some(intent) => {
                self.intent_repo
                    .complete_from_pending(intent.id, provider_payment_id.clone())
                    .await?
            }
            None => {
                warn!(
                    %booking_id,
                    provider_payment_id = ?provider_payment_id,
                    "settlement: approved payment has no matching intent"
                );
                false
            }
        };

        let booking_confirmed = self
            .booking_repo
            .transition_status(
                booking_id,
                BookingStatus::PendingPayment,
                BookingStatus::Confirmed,
            )
            .await?;

        if intent_completed || booking_confirmed {
            info!(
                %booking_id,
                provider_payment_id = ?provider_payment_id,
                intent_completed,
                booking_confirmed,
                "settlement: approved payment applied"
            );
        }

        Ok(SettlementOutcome {
            intent_completed,
            booking_confirmed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::payment_intents::PaymentIntentEntity,
        repositories::{
            bookings::MockBookingRepository, payment_intents::MockPaymentIntentRepository,
        },
    };
    use chrono::Utc;
    use mockall::predicate::eq;

    fn pending_intent(booking_id: Uuid) -> PaymentIntentEntity {
        let now = Utc::now();
        PaymentIntentEntity {
            id: Uuid::new_v4(),
            booking_id,
            provider: "mercadopago".to_string(),
            provider_payment_id: None,
            method: "card".to_string(),
            status: "pending".to_string(),
            amount_usd: 500.0,
            amount_ars: 500_000.0,
            fx_rate: 1000.0,
            commission_fee_usd: None,
            redirect_url: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn completes_pending_intent_and_confirms_booking() {
        let booking_id = Uuid::new_v4();
        let intent = pending_intent(booking_id);
        let intent_id = intent.id;

        let mut intent_repo = MockPaymentIntentRepository::new();
        intent_repo
            .expect_find_by_provider_payment_id()
            .with(eq("mp-1"))
            .returning(|_| Box::pin(async { Ok(None) }));
        intent_repo
            .expect_find_by_booking_id()
            .with(eq(booking_id))
            .returning(move |_| {
                let intent = intent.clone();
                Box::pin(async move { Ok(vec![intent]) })
            });
        intent_repo
            .expect_complete_from_pending()
            .with(eq(intent_id), eq(Some("mp-1".to_string())))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(true) }));

        let mut booking_repo = MockBookingRepository::new();
        booking_repo
            .expect_transition_status()
            .with(
                eq(booking_id),
                eq(BookingStatus::PendingPayment),
                eq(BookingStatus::Confirmed),
            )
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(true) }));

        let service = SettlementService::new(Arc::new(booking_repo), Arc::new(intent_repo));
        let outcome = service
            .apply_approved_payment(booking_id, Some("mp-1".to_string()))
            .await
            .unwrap();

        assert!(outcome.intent_completed);
        assert!(outcome.booking_confirmed);
    }

    #[tokio::test]
    async fn redelivery_is_a_noop() {
        let booking_id = Uuid::new_v4();
        let mut settled = pending_intent(booking_id);
        settled.status = "completed".to_string();
        settled.provider_payment_id = Some("mp-1".to_string());
        let intent_id = settled.id;

        let mut intent_repo = MockPaymentIntentRepository::new();
        intent_repo
            .expect_find_by_provider_payment_id()
            .with(eq("mp-1"))
            .returning(move |_| {
                let settled = settled.clone();
                Box::pin(async move { Ok(Some(settled)) })
            });
        intent_repo
            .expect_complete_from_pending()
            .with(eq(intent_id), eq(Some("mp-1".to_string())))
            .returning(|_, _| Box::pin(async { Ok(false) }));

        let mut booking_repo = MockBookingRepository::new();
        booking_repo
            .expect_transition_status()
            .returning(|_, _, _| Box::pin(async { Ok(false) }));

        let service = SettlementService::new(Arc::new(booking_repo), Arc::new(intent_repo));
        let outcome = service
            .apply_approved_payment(booking_id, Some("mp-1".to_string()))
            .await
            .unwrap();

        assert!(!outcome.intent_completed);
        assert!(!outcome.booking_confirmed);
    }

    #[tokio::test]
    async fn confirms_booking_even_without_a_matching_intent() {
        let booking_id = Uuid::new_v4();

        let mut intent_repo = MockPaymentIntentRepository::new();
        intent_repo
            .expect_find_by_booking_id()
            .returning(|_| Box::pin(async { Ok(vec![]) }));

        let mut booking_repo = MockBookingRepository::new();
        booking_repo
            .expect_transition_status()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(true) }));

        let service = SettlementService::new(Arc::new(booking_repo), Arc::new(intent_repo));
        let outcome = service
            .apply_approved_payment(booking_id, None)
            .await
            .unwrap();

        assert!(!outcome.intent_completed);
        assert!(outcome.booking_confirmed);
    }
}
