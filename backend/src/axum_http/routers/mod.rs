pub mod dlq;
pub mod guarantee_holds;
pub mod payments;
pub mod reconciliation;
pub mod risk;
