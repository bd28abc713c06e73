use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::risk_snapshots;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = risk_snapshots)]
pub struct RiskSnapshotEntity {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub vehicle_value_usd: f64,
    pub pricing_bucket: String,
    pub coverage_upgrade: String,
    pub deductible_usd: f64,
    pub rollover_deductible_usd: f64,
    pub hold_estimated_usd: f64,
    pub hold_estimated_ars: f64,
    pub credit_security_usd: f64,
    pub fx_rate: f64,
    pub captured_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = risk_snapshots)]
pub struct InsertRiskSnapshotEntity {
    pub booking_id: Uuid,
    pub vehicle_value_usd: f64,
    pub pricing_bucket: String,
    pub coverage_upgrade: String,
    pub deductible_usd: f64,
    pub rollover_deductible_usd: f64,
    pub hold_estimated_usd: f64,
    pub hold_estimated_ars: f64,
    pub credit_security_usd: f64,
    pub fx_rate: f64,
    pub captured_at: DateTime<Utc>,
}

pub type NewRiskSnapshotEntity = InsertRiskSnapshotEntity;
