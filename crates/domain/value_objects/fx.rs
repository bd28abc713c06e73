use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Snapshots are good for a week; beyond a 10% drift the quote must be
/// recomputed even inside that window.
pub const SNAPSHOT_TTL_DAYS: i64 = 7;
pub const VARIATION_THRESHOLD: f64 = 0.10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FxSnapshot {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub captured_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl FxSnapshot {
    pub fn capture(from: &str, to: &str, rate: f64, now: DateTime<Utc>) -> Self {
        Self {
            from_currency: from.to_string(),
            to_currency: to.to_string(),
            rate,
            captured_at: now,
            expires_at: now + Duration::days(SNAPSHOT_TTL_DAYS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn requires_revalidation(&self, current_rate: f64) -> bool {
        if self.rate <= 0.0 {
            return true;
        }
        ((current_rate - self.rate) / self.rate).abs() > VARIATION_THRESHOLD
    }
}
