use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use diesel::{
    Connection, ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, insert_into, update,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{wallet_ledger_entries, wallet_locks, wallets},
    },
};
use domain::{
    entities::wallets::{InsertWalletLedgerEntryEntity, InsertWalletLockEntity, WalletEntity},
    repositories::wallets::WalletRepository,
    value_objects::{
        enums::{ledger_entry_kinds::LedgerEntryKind, wallet_lock_statuses::WalletLockStatus},
        money::{round2, usd_to_cents},
        wallet::{LockFundsReceipt, LockOutcome, UnlockOutcome, WalletBalance},
    },
};

pub struct WalletPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl WalletPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl WalletRepository for WalletPostgres {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<WalletEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let wallet = wallets::table
            .filter(wallets::user_id.eq(user_id))
            .first::<WalletEntity>(&mut conn)
            .optional()?;

        Ok(wallet)
    }

    async fn get_balance(&self, user_id: Uuid) -> Result<WalletBalance> {
        let wallet = self
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| anyhow!("no wallet for user {user_id}"))?;

        Ok(WalletBalance {
            balance_usd: wallet.balance_usd,
            protected_credit_usd: wallet.protected_credit_usd,
            locked_usd: wallet.locked_usd,
            available_usd: round2(wallet.balance_usd - wallet.locked_usd),
        })
    }

    async fn lock_funds(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        amount_usd: f64,
        reason: &str,
    ) -> Result<LockOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The row lock serializes concurrent lock attempts for the same
        // wallet, so two bookings can never both pass the balance check.
        conn.transaction::<LockOutcome, anyhow::Error, _>(|conn| {
            let wallet = wallets::table
                .filter(wallets::user_id.eq(user_id))
                .for_update()
                .first::<WalletEntity>(conn)
                .optional()?
                .ok_or_else(|| anyhow!("no wallet for user {user_id}"))?;

            let available_usd = round2(wallet.balance_usd - wallet.locked_usd);
            if available_usd < amount_usd {
                return Ok(LockOutcome::InsufficientFunds {
                    available_usd,
                    requested_usd: amount_usd,
                });
            }

            let lock_id = insert_into(wallet_locks::table)
                .values(&InsertWalletLockEntity {
                    wallet_id: wallet.id,
                    booking_id,
                    amount_usd,
                    status: WalletLockStatus::Locked.to_string(),
                    reason: reason.to_string(),
                })
                .returning(wallet_locks::id)
                .get_result::<Uuid>(conn)?;

            update(wallets::table.find(wallet.id))
                .set((
                    wallets::locked_usd.eq(round2(wallet.locked_usd + amount_usd)),
                    wallets::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            Ok(LockOutcome::Locked(LockFundsReceipt {
                lock_id,
                amount_usd,
            }))
        })
    }

    async fn unlock_funds(&self, booking_id: Uuid) -> Result<UnlockOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        conn.transaction::<UnlockOutcome, anyhow::Error, _>(|conn| {
            let Some(lock) = active_lock_for_update(conn, booking_id)? else {
                return Ok(UnlockOutcome::NoActiveLock);
            };

            update(wallet_locks::table.find(lock.0))
                .set((
                    wallet_locks::status.eq(WalletLockStatus::Released.to_string()),
                    wallet_locks::released_at.eq(Some(Utc::now())),
                ))
                .execute(conn)?;

            adjust_locked(conn, lock.1, -lock.2)?;

            Ok(UnlockOutcome::Released {
                amount_usd: lock.2,
            })
        })
    }

    async fn charge_locked_funds(&self, booking_id: Uuid) -> Result<UnlockOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        conn.transaction::<UnlockOutcome, anyhow::Error, _>(|conn| {
            let Some((lock_id, wallet_id, amount_usd)) =
                active_lock_for_update(conn, booking_id)?
            else {
                return Ok(UnlockOutcome::NoActiveLock);
            };

            update(wallet_locks::table.find(lock_id))
                .set((
                    wallet_locks::status.eq(WalletLockStatus::Released.to_string()),
                    wallet_locks::released_at.eq(Some(Utc::now())),
                ))
                .execute(conn)?;

            insert_into(wallet_ledger_entries::table)
                .values(&InsertWalletLedgerEntryEntity {
                    wallet_id,
                    booking_id: Some(booking_id),
                    kind: LedgerEntryKind::Charge.to_string(),
                    amount_cents: -usd_to_cents(amount_usd),
                    note: None,
                })
                .execute(conn)?;

            let wallet = wallets::table
                .find(wallet_id)
                .first::<WalletEntity>(conn)?;
            update(wallets::table.find(wallet_id))
                .set((
                    wallets::balance_usd.eq(round2(wallet.balance_usd - amount_usd)),
                    wallets::locked_usd.eq(round2(wallet.locked_usd - amount_usd).max(0.0)),
                    wallets::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            Ok(UnlockOutcome::Released { amount_usd })
        })
    }

    async fn credit(
        &self,
        user_id: Uuid,
        booking_id: Option<Uuid>,
        kind: LedgerEntryKind,
        amount_usd: f64,
        note: Option<String>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        conn.transaction::<(), anyhow::Error, _>(|conn| {
            let wallet = wallets::table
                .filter(wallets::user_id.eq(user_id))
                .for_update()
                .first::<WalletEntity>(conn)
                .optional()?
                .ok_or_else(|| anyhow!("no wallet for user {user_id}"))?;

            insert_into(wallet_ledger_entries::table)
                .values(&InsertWalletLedgerEntryEntity {
                    wallet_id: wallet.id,
                    booking_id,
                    kind: kind.to_string(),
                    amount_cents: usd_to_cents(amount_usd),
                    note,
                })
                .execute(conn)?;

            let protected_credit_usd = if kind == LedgerEntryKind::ProtectedCredit {
                round2(wallet.protected_credit_usd + amount_usd)
            } else {
                wallet.protected_credit_usd
            };

            update(wallets::table.find(wallet.id))
                .set((
                    wallets::balance_usd.eq(round2(wallet.balance_usd + amount_usd)),
                    wallets::protected_credit_usd.eq(protected_credit_usd),
                    wallets::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            Ok(())
        })
    }

    async fn list_wallets(&self, limit: i64) -> Result<Vec<WalletEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = wallets::table
            .order(wallets::updated_at.desc())
            .limit(limit)
            .load::<WalletEntity>(&mut conn)?;

        Ok(result)
    }

    async fn sum_ledger_cents(&self, wallet_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let sum = wallet_ledger_entries::table
            .filter(wallet_ledger_entries::wallet_id.eq(wallet_id))
            .select(diesel::dsl::sql::<diesel::sql_types::BigInt>(
                "COALESCE(SUM(amount_cents), 0)",
            ))
            .get_result::<i64>(&mut conn)?;

        Ok(sum)
    }
}

/// Loads and row-locks the active lock for a booking, returning
/// `(lock_id, wallet_id, amount_usd)`.
fn active_lock_for_update(
    conn: &mut diesel::PgConnection,
    booking_id: Uuid,
) -> Result<Option<(Uuid, Uuid, f64)>> {
    let lock = wallet_locks::table
        .filter(wallet_locks::booking_id.eq(booking_id))
        .filter(wallet_locks::status.eq(WalletLockStatus::Locked.to_string()))
        .select((
            wallet_locks::id,
            wallet_locks::wallet_id,
            wallet_locks::amount_usd,
        ))
        .for_update()
        .first::<(Uuid, Uuid, f64)>(conn)
        .optional()?;

    Ok(lock)
}

fn adjust_locked(conn: &mut diesel::PgConnection, wallet_id: Uuid, delta_usd: f64) -> Result<()> {
    let wallet = wallets::table.find(wallet_id).first::<WalletEntity>(conn)?;
    update(wallets::table.find(wallet_id))
        .set((
            wallets::locked_usd.eq(round2(wallet.locked_usd + delta_usd).max(0.0)),
            wallets::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;
    Ok(())
}
