use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::infra::db::postgres::schema::webhook_dead_letter;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = webhook_dead_letter)]
pub struct DlqItemEntity {
    pub id: Uuid,
    pub event_type: String,
    pub payload: Value,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub status: String,
    pub next_retry_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = webhook_dead_letter)]
pub struct InsertDlqItemEntity {
    pub event_type: String,
    pub payload: Value,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub status: String,
    pub next_retry_at: DateTime<Utc>,
}

pub type NewDlqItemEntity = InsertDlqItemEntity;
