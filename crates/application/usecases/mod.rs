pub mod dlq_processor;
pub mod fx;
pub mod guarantee_holds;
pub mod payment_orchestrator;
pub mod reconciliation;
pub mod risk;
pub mod settlement;
