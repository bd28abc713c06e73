use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct WalletBalance {
    pub balance_usd: f64,
    pub protected_credit_usd: f64,
    pub locked_usd: f64,
    pub available_usd: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LockFundsReceipt {
    pub lock_id: Uuid,
    pub amount_usd: f64,
}

/// Result of a lock attempt. Insufficient funds is an expected outcome, not
/// a repository error.
#[derive(Debug, Clone, PartialEq)]
pub enum LockOutcome {
    Locked(LockFundsReceipt),
    InsufficientFunds {
        available_usd: f64,
        requested_usd: f64,
    },
}

/// Releasing a booking that holds no active lock is a no-op so compensations
/// can be retried safely.
#[derive(Debug, Clone, PartialEq)]
pub enum UnlockOutcome {
    Released { amount_usd: f64 },
    NoActiveLock,
}
