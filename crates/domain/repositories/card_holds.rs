use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::card_holds::{CardHoldEntity, NewCardHoldEntity},
    value_objects::enums::card_hold_statuses::CardHoldStatus,
};

#[async_trait]
#[automock]
pub trait CardHoldRepository {
    async fn create(&self, hold: NewCardHoldEntity) -> Result<Uuid>;

    async fn find_active_by_booking_id(&self, booking_id: Uuid) -> Result<Option<CardHoldEntity>>;

    async fn transition_status(
        &self,
        hold_id: Uuid,
        from: CardHoldStatus,
        to: CardHoldStatus,
    ) -> Result<bool>;

    async fn list_expired_active(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CardHoldEntity>>;
}
