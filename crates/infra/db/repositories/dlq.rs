use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl, insert_into, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::webhook_dead_letter},
};
use domain::{
    entities::dlq_items::{DlqItemEntity, NewDlqItemEntity},
    repositories::dlq::DlqRepository,
    value_objects::enums::dlq_statuses::DlqStatus,
};

pub struct DlqPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl DlqPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl DlqRepository for DlqPostgres {
    async fn enqueue(&self, item: NewDlqItemEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let item_id = insert_into(webhook_dead_letter::table)
            .values(&item)
            .returning(webhook_dead_letter::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(item_id)
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<DlqItemEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let items = webhook_dead_letter::table
            .filter(
                webhook_dead_letter::status.eq_any(vec![
                    DlqStatus::Pending.to_string(),
                    DlqStatus::Retrying.to_string(),
                ]),
            )
            .filter(webhook_dead_letter::next_retry_at.le(now))
            .order(webhook_dead_letter::next_retry_at.asc())
            .limit(limit)
            .load::<DlqItemEntity>(&mut conn)?;

        Ok(items)
    }

    async fn claim(
        &self,
        item_id: Uuid,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The `next_retry_at <= now` guard is what makes the claim exclusive:
        // the winner pushes the horizon to `lease_until`, so a concurrent
        // sweep no longer matches.
        let affected = update(
            webhook_dead_letter::table
                .find(item_id)
                .filter(webhook_dead_letter::status.eq_any(vec![
                    DlqStatus::Pending.to_string(),
                    DlqStatus::Retrying.to_string(),
                ]))
                .filter(webhook_dead_letter::next_retry_at.le(now)),
        )
        .set((
            webhook_dead_letter::status.eq(DlqStatus::Retrying.to_string()),
            webhook_dead_letter::next_retry_at.eq(lease_until),
            webhook_dead_letter::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(affected > 0)
    }

    async fn mark_resolved(&self, item_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(
            webhook_dead_letter::table
                .find(item_id)
                .filter(webhook_dead_letter::status.eq(DlqStatus::Retrying.to_string())),
        )
        .set((
            webhook_dead_letter::status.eq(DlqStatus::Resolved.to_string()),
            webhook_dead_letter::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(())
    }

    async fn schedule_retry(
        &self,
        item_id: Uuid,
        error_message: String,
        next_retry_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(
            webhook_dead_letter::table
                .find(item_id)
                .filter(webhook_dead_letter::status.eq(DlqStatus::Retrying.to_string())),
        )
        .set((
            webhook_dead_letter::retry_count.eq(webhook_dead_letter::retry_count + 1),
            webhook_dead_letter::error_message.eq(Some(error_message)),
            webhook_dead_letter::next_retry_at.eq(next_retry_at),
            webhook_dead_letter::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_failed(&self, item_id: Uuid, error_message: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(
            webhook_dead_letter::table
                .find(item_id)
                .filter(webhook_dead_letter::status.eq(DlqStatus::Retrying.to_string())),
        )
        .set((
            webhook_dead_letter::status.eq(DlqStatus::Failed.to_string()),
            webhook_dead_letter::retry_count.eq(webhook_dead_letter::retry_count + 1),
            webhook_dead_letter::error_message.eq(Some(error_message)),
            webhook_dead_letter::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(())
    }

    async fn count_by_status(&self, status: DlqStatus) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = webhook_dead_letter::table
            .filter(webhook_dead_letter::status.eq(status.to_string()))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }
}
