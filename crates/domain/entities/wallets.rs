use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::{wallet_ledger_entries, wallet_locks, wallets};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = wallets)]
pub struct WalletEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance_usd: f64,
    pub protected_credit_usd: f64,
    pub locked_usd: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = wallet_locks)]
pub struct WalletLockEntity {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub booking_id: Uuid,
    pub amount_usd: f64,
    pub status: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = wallet_locks)]
pub struct InsertWalletLockEntity {
    pub wallet_id: Uuid,
    pub booking_id: Uuid,
    pub amount_usd: f64,
    pub status: String,
    pub reason: String,
}

/// Append-only ledger row; amounts are signed cents so the wallet balance is
/// always the plain sum of its entries.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = wallet_ledger_entries)]
pub struct WalletLedgerEntryEntity {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub kind: String,
    pub amount_cents: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = wallet_ledger_entries)]
pub struct InsertWalletLedgerEntryEntity {
    pub wallet_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub kind: String,
    pub amount_cents: i64,
    pub note: Option<String>,
}
