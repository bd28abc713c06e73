pub mod bookings;
pub mod card_holds;
pub mod dlq_items;
pub mod payment_intents;
pub mod risk_snapshots;
pub mod wallets;
