use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::payment_intents;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_intents)]
pub struct PaymentIntentEntity {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider: String,
    pub provider_payment_id: Option<String>,
    pub method: String,
    pub status: String,
    pub amount_usd: f64,
    pub amount_ars: f64,
    pub fx_rate: f64,
    pub commission_fee_usd: Option<f64>,
    pub redirect_url: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payment_intents)]
pub struct InsertPaymentIntentEntity {
    pub booking_id: Uuid,
    pub provider: String,
    pub provider_payment_id: Option<String>,
    pub method: String,
    pub status: String,
    pub amount_usd: f64,
    pub amount_ars: f64,
    pub fx_rate: f64,
    pub commission_fee_usd: Option<f64>,
    pub redirect_url: Option<String>,
    pub rejection_reason: Option<String>,
}

// NewPaymentIntentEntity is the application-facing alias for inserting rows.
pub type NewPaymentIntentEntity = InsertPaymentIntentEntity;
