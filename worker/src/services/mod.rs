pub mod dlq_worker;
pub mod reconciliation_worker;
