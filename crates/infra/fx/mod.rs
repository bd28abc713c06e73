pub mod fx_client;
