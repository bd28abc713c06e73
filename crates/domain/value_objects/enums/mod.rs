pub mod booking_statuses;
pub mod card_hold_statuses;
pub mod coverage_upgrades;
pub mod dlq_event_types;
pub mod dlq_statuses;
pub mod ledger_entry_kinds;
pub mod payment_intent_statuses;
pub mod payment_methods;
pub mod pricing_buckets;
pub mod wallet_lock_statuses;
