use anyhow::Result;
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, insert_into};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::risk_snapshots},
};
use domain::{
    entities::risk_snapshots::{NewRiskSnapshotEntity, RiskSnapshotEntity},
    repositories::risk_snapshots::RiskSnapshotRepository,
};

pub struct RiskSnapshotPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl RiskSnapshotPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl RiskSnapshotRepository for RiskSnapshotPostgres {
    async fn create(&self, snapshot: NewRiskSnapshotEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let snapshot_id = insert_into(risk_snapshots::table)
            .values(&snapshot)
            .returning(risk_snapshots::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(snapshot_id)
    }

    async fn find_latest_by_booking_id(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<RiskSnapshotEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let snapshot = risk_snapshots::table
            .filter(risk_snapshots::booking_id.eq(booking_id))
            .order(risk_snapshots::captured_at.desc())
            .first::<RiskSnapshotEntity>(&mut conn)
            .optional()?;

        Ok(snapshot)
    }
}
