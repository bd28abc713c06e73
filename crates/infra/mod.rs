pub mod alerts;
pub mod commission;
pub mod db;
pub mod fx;
pub mod payments;
