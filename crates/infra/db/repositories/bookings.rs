use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::bookings},
};
use domain::{
    entities::bookings::BookingEntity,
    repositories::bookings::BookingRepository,
    value_objects::enums::{booking_statuses::BookingStatus, payment_methods::PaymentMethod},
};

pub struct BookingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BookingRepository for BookingPostgres {
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let booking = bookings::table
            .find(booking_id)
            .first::<BookingEntity>(&mut conn)
            .optional()?;

        Ok(booking)
    }

    async fn mark_payment(
        &self,
        booking_id: Uuid,
        method: PaymentMethod,
        status: BookingStatus,
        wallet_amount_cents: Option<i64>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(bookings::table.find(booking_id))
            .set((
                bookings::payment_method.eq(Some(method.to_string())),
                bookings::status.eq(status.to_string()),
                bookings::wallet_amount_cents.eq(wallet_amount_cents),
                bookings::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn transition_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The `from` guard in the where clause makes concurrent transitions
        // race-safe: only one update ever matches.
        let affected = update(
            bookings::table
                .find(booking_id)
                .filter(bookings::status.eq(from.to_string())),
        )
        .set((
            bookings::status.eq(to.to_string()),
            bookings::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(affected > 0)
    }

    async fn list_by_status_since(
        &self,
        status: BookingStatus,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = bookings::table
            .filter(bookings::status.eq(status.to_string()))
            .filter(bookings::created_at.ge(since))
            .order(bookings::created_at.asc())
            .limit(limit)
            .load::<BookingEntity>(&mut conn)?;

        Ok(result)
    }
}
