use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::payment_intents::{NewPaymentIntentEntity, PaymentIntentEntity},
    value_objects::enums::payment_intent_statuses::PaymentIntentStatus,
};

#[async_trait]
#[automock]
pub trait PaymentIntentRepository {
    async fn create(&self, intent: NewPaymentIntentEntity) -> Result<Uuid>;

    async fn find_by_id(&self, intent_id: Uuid) -> Result<Option<PaymentIntentEntity>>;

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<Option<PaymentIntentEntity>>;

    /// Latest intent first.
    async fn find_by_booking_id(&self, booking_id: Uuid) -> Result<Vec<PaymentIntentEntity>>;

    /// Completes a pending intent, recording the provider payment id. Returns
    /// false when the intent already left `pending`.
    async fn complete_from_pending(
        &self,
        intent_id: Uuid,
        provider_payment_id: Option<String>,
    ) -> Result<bool>;

    async fn transition_status(
        &self,
        intent_id: Uuid,
        from: PaymentIntentStatus,
        to: PaymentIntentStatus,
    ) -> Result<bool>;

    async fn mark_failed(&self, intent_id: Uuid, rejection_reason: String) -> Result<()>;

    async fn list_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PaymentIntentEntity>>;

    async fn list_completed_since(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PaymentIntentEntity>>;
}
