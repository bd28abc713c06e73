use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::bookings;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = bookings)]
pub struct BookingEntity {
    pub id: Uuid,
    pub renter_id: Uuid,
    pub vehicle_id: Uuid,
    pub status: String,
    pub payment_method: Option<String>,
    pub total_amount_usd: f64,
    pub currency: String,
    pub wallet_amount_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
