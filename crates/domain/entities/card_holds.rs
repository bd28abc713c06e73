use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::card_holds;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = card_holds)]
pub struct CardHoldEntity {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider_hold_id: String,
    pub amount_usd: f64,
    pub amount_ars: f64,
    pub status: String,
    pub placed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = card_holds)]
pub struct InsertCardHoldEntity {
    pub booking_id: Uuid,
    pub provider_hold_id: String,
    pub amount_usd: f64,
    pub amount_ars: f64,
    pub status: String,
    pub placed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub type NewCardHoldEntity = InsertCardHoldEntity;
