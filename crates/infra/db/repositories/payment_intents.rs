use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, insert_into, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payment_intents},
};
use domain::{
    entities::payment_intents::{NewPaymentIntentEntity, PaymentIntentEntity},
    repositories::payment_intents::PaymentIntentRepository,
    value_objects::enums::payment_intent_statuses::PaymentIntentStatus,
};

pub struct PaymentIntentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentIntentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentIntentRepository for PaymentIntentPostgres {
    async fn create(&self, intent: NewPaymentIntentEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let intent_id = insert_into(payment_intents::table)
            .values(&intent)
            .returning(payment_intents::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(intent_id)
    }

    async fn find_by_id(&self, intent_id: Uuid) -> Result<Option<PaymentIntentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let intent = payment_intents::table
            .find(intent_id)
            .first::<PaymentIntentEntity>(&mut conn)
            .optional()?;

        Ok(intent)
    }

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<Option<PaymentIntentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let intent = payment_intents::table
            .filter(payment_intents::provider_payment_id.eq(provider_payment_id))
            .first::<PaymentIntentEntity>(&mut conn)
            .optional()?;

        Ok(intent)
    }

    async fn find_by_booking_id(&self, booking_id: Uuid) -> Result<Vec<PaymentIntentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let intents = payment_intents::table
            .filter(payment_intents::booking_id.eq(booking_id))
            .order(payment_intents::created_at.desc())
            .load::<PaymentIntentEntity>(&mut conn)?;

        Ok(intents)
    }

    async fn complete_from_pending(
        &self,
        intent_id: Uuid,
        provider_payment_id: Option<String>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(
            payment_intents::table
                .find(intent_id)
                .filter(payment_intents::status.eq(PaymentIntentStatus::Pending.to_string())),
        )
        .set((
            payment_intents::status.eq(PaymentIntentStatus::Completed.to_string()),
            payment_intents::provider_payment_id.eq(provider_payment_id),
            payment_intents::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(affected > 0)
    }

    async fn transition_status(
        &self,
        intent_id: Uuid,
        from: PaymentIntentStatus,
        to: PaymentIntentStatus,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(
            payment_intents::table
                .find(intent_id)
                .filter(payment_intents::status.eq(from.to_string())),
        )
        .set((
            payment_intents::status.eq(to.to_string()),
            payment_intents::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(affected > 0)
    }

    async fn mark_failed(&self, intent_id: Uuid, rejection_reason: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(payment_intents::table.find(intent_id))
            .set((
                payment_intents::status.eq(PaymentIntentStatus::Failed.to_string()),
                payment_intents::rejection_reason.eq(Some(rejection_reason)),
                payment_intents::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn list_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PaymentIntentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let intents = payment_intents::table
            .filter(payment_intents::status.eq(PaymentIntentStatus::Pending.to_string()))
            .filter(payment_intents::created_at.lt(cutoff))
            .filter(payment_intents::created_at.ge(since))
            .order(payment_intents::created_at.asc())
            .limit(limit)
            .load::<PaymentIntentEntity>(&mut conn)?;

        Ok(intents)
    }

    async fn list_completed_since(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PaymentIntentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let intents = payment_intents::table
            .filter(payment_intents::status.eq(PaymentIntentStatus::Completed.to_string()))
            .filter(payment_intents::updated_at.ge(since))
            .order(payment_intents::updated_at.desc())
            .limit(limit)
            .load::<PaymentIntentEntity>(&mut conn)?;

        Ok(intents)
    }
}
