pub mod bookings;
pub mod card_holds;
pub mod dlq;
pub mod payment_intents;
pub mod risk_snapshots;
pub mod wallets;
