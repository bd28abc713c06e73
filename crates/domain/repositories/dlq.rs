use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::dlq_items::{DlqItemEntity, NewDlqItemEntity},
    value_objects::enums::dlq_statuses::DlqStatus,
};

#[async_trait]
#[automock]
pub trait DlqRepository {
    async fn enqueue(&self, item: NewDlqItemEntity) -> Result<Uuid>;

    /// Items in `pending` or `retrying` whose `next_retry_at` has passed,
    /// oldest first.
    async fn list_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<DlqItemEntity>>;

    /// Claims a due item before dispatch: a status-guarded
    /// `pending|retrying -> retrying` transition that also pushes
    /// `next_retry_at` to `lease_until`, so two concurrent sweeps can never
    /// both claim the same item. Returns false when another sweep got there
    /// first or the item is already settled.
    async fn claim(
        &self,
        item_id: Uuid,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> Result<bool>;

    /// Settles a claimed (`retrying`) item; a no-op when another sweep
    /// settled it in the meantime.
    async fn mark_resolved(&self, item_id: Uuid) -> Result<()>;

    /// Records the failure on a claimed item, bumps `retry_count` and
    /// schedules the next attempt.
    async fn schedule_retry(
        &self,
        item_id: Uuid,
        error_message: String,
        next_retry_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Terminal state; the item is never picked up again automatically.
    async fn mark_failed(&self, item_id: Uuid, error_message: String) -> Result<()>;

    async fn count_by_status(&self, status: DlqStatus) -> Result<i64>;
}
