use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::bookings::BookingEntity,
    value_objects::enums::{booking_statuses::BookingStatus, payment_methods::PaymentMethod},
};

#[async_trait]
#[automock]
pub trait BookingRepository {
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>>;

    /// Sets the payment-side fields in one update.
    async fn mark_payment(
        &self,
        booking_id: Uuid,
        method: PaymentMethod,
        status: BookingStatus,
        wallet_amount_cents: Option<i64>,
    ) -> Result<()>;

    /// Status-guarded transition; returns false when the booking was not in
    /// `from` (already transitioned by a concurrent delivery).
    async fn transition_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool>;

    async fn list_by_status_since(
        &self,
        status: BookingStatus,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<BookingEntity>>;
}
