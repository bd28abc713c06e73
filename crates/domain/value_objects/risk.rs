use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{coverage_upgrades::CoverageUpgrade, pricing_buckets::PricingBucket};

/// Vehicle-value tiers mapped to the base damage deductible in USD.
/// Upper bounds are exclusive; the last tier is open-ended.
pub const GUARANTEE_TIERS: [(f64, f64); 5] = [
    (8_000.0, 300.0),
    (15_000.0, 500.0),
    (25_000.0, 800.0),
    (40_000.0, 1_500.0),
    (70_000.0, 2_500.0),
];
pub const TOP_TIER_DEDUCTIBLE_USD: f64 = 4_000.0;

pub const ROLLOVER_MULTIPLIER: f64 = 1.5;
pub const HOLD_MIN_USD: f64 = 150.0;
pub const HOLD_MAX_USD: f64 = 2_000.0;
pub const CREDIT_SECURITY_LOW_USD: f64 = 300.0;
pub const CREDIT_SECURITY_HIGH_USD: f64 = 500.0;
pub const CREDIT_SECURITY_VALUE_CUTOFF_USD: f64 = 20_000.0;

#[derive(Debug, Clone, Deserialize)]
pub struct CalculateRiskSnapshotParams {
    pub vehicle_value_usd: f64,
    pub pricing_bucket: PricingBucket,
    pub coverage_upgrade: CoverageUpgrade,
    pub fx_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskSnapshot {
    pub vehicle_value_usd: f64,
    pub pricing_bucket: PricingBucket,
    pub coverage_upgrade: CoverageUpgrade,
    pub deductible_usd: f64,
    pub rollover_deductible_usd: f64,
    pub hold_estimated_usd: f64,
    pub hold_estimated_ars: f64,
    pub credit_security_usd: f64,
    pub fx_rate: f64,
    pub captured_at: DateTime<Utc>,
}
