use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::wallets::WalletEntity,
    value_objects::{
        enums::ledger_entry_kinds::LedgerEntryKind,
        wallet::{LockOutcome, UnlockOutcome, WalletBalance},
    },
};

#[async_trait]
#[automock]
pub trait WalletRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<WalletEntity>>;

    async fn get_balance(&self, user_id: Uuid) -> Result<WalletBalance>;

    /// Locks `amount_usd` for a booking, recording `reason` on the lock row
    /// for audit. Runs inside a transaction that takes a row lock on the
    /// wallet so concurrent locks for the same user serialize and cannot
    /// both succeed past the available balance.
    async fn lock_funds(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        amount_usd: f64,
        reason: &str,
    ) -> Result<LockOutcome>;

    /// Releases the active lock held for a booking. Idempotent: a booking
    /// without an active lock reports `NoActiveLock`.
    async fn unlock_funds(&self, booking_id: Uuid) -> Result<UnlockOutcome>;

    /// Charges the active lock for a booking: the lock is consumed and a
    /// negative ledger entry is appended.
    async fn charge_locked_funds(&self, booking_id: Uuid) -> Result<UnlockOutcome>;

    /// Appends a signed ledger entry and adjusts the stored balance.
    async fn credit(
        &self,
        user_id: Uuid,
        booking_id: Option<Uuid>,
        kind: LedgerEntryKind,
        amount_usd: f64,
        note: Option<String>,
    ) -> Result<()>;

    async fn list_wallets(&self, limit: i64) -> Result<Vec<WalletEntity>>;

    async fn sum_ledger_cents(&self, wallet_id: Uuid) -> Result<i64>;
}
