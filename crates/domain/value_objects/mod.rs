pub mod alerts;
pub mod dlq;
pub mod enums;
pub mod fx;
pub mod money;
pub mod payments;
pub mod provider;
pub mod reconciliation;
pub mod rejection_reasons;
pub mod risk;
pub mod wallet;
