use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, insert_into, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::card_holds},
};
use domain::{
    entities::card_holds::{CardHoldEntity, NewCardHoldEntity},
    repositories::card_holds::CardHoldRepository,
    value_objects::enums::card_hold_statuses::CardHoldStatus,
};

pub struct CardHoldPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CardHoldPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CardHoldRepository for CardHoldPostgres {
    async fn create(&self, hold: NewCardHoldEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let hold_id = insert_into(card_holds::table)
            .values(&hold)
            .returning(card_holds::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(hold_id)
    }

    async fn find_active_by_booking_id(&self, booking_id: Uuid) -> Result<Option<CardHoldEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let hold = card_holds::table
            .filter(card_holds::booking_id.eq(booking_id))
            .filter(card_holds::status.eq(CardHoldStatus::Active.to_string()))
            .first::<CardHoldEntity>(&mut conn)
            .optional()?;

        Ok(hold)
    }

    async fn transition_status(
        &self,
        hold_id: Uuid,
        from: CardHoldStatus,
        to: CardHoldStatus,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let released_at = match to {
            CardHoldStatus::Cancelled | CardHoldStatus::Expired => Some(Utc::now()),
            _ => None,
        };

        let affected = update(
            card_holds::table
                .find(hold_id)
                .filter(card_holds::status.eq(from.to_string())),
        )
        .set((
            card_holds::status.eq(to.to_string()),
            card_holds::released_at.eq(released_at),
            card_holds::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(affected > 0)
    }

    async fn list_expired_active(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CardHoldEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let holds = card_holds::table
            .filter(card_holds::status.eq(CardHoldStatus::Active.to_string()))
            .filter(card_holds::expires_at.le(now))
            .order(card_holds::expires_at.asc())
            .limit(limit)
            .load::<CardHoldEntity>(&mut conn)?;

        Ok(holds)
    }
}
