use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::risk_snapshots::{NewRiskSnapshotEntity, RiskSnapshotEntity};

#[async_trait]
#[automock]
pub trait RiskSnapshotRepository {
    async fn create(&self, snapshot: NewRiskSnapshotEntity) -> Result<Uuid>;

    async fn find_latest_by_booking_id(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<RiskSnapshotEntity>>;
}
