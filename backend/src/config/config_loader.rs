use anyhow::{Ok, Result};

use super::config_model::DotEnvyConfig;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = super::config_model::BackendServer {
        port: std::env::var("SERVER_PORT_BACKEND")
            .expect("SERVER_PORT_BACKEND is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = super::config_model::Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let mercadopago = super::config_model::MercadoPago {
        base_url: std::env::var("MERCADOPAGO_BASE_URL")
            .unwrap_or_else(|_| "https://api.mercadopago.com".to_string()),
        access_token: std::env::var("MERCADOPAGO_ACCESS_TOKEN")
            .expect("MERCADOPAGO_ACCESS_TOKEN is invalid"),
        webhook_secret: std::env::var("MERCADOPAGO_WEBHOOK_SECRET")
            .expect("MERCADOPAGO_WEBHOOK_SECRET is invalid"),
        back_url: std::env::var("MERCADOPAGO_BACK_URL").expect("MERCADOPAGO_BACK_URL is invalid"),
    };

    let fx = super::config_model::Fx {
        base_url: std::env::var("FX_API_BASE_URL").expect("FX_API_BASE_URL is invalid"),
        api_key: std::env::var("FX_API_KEY").expect("FX_API_KEY is invalid"),
    };

    let alerts = super::config_model::Alerts {
        webhook_urls: std::env::var("ALERT_WEBHOOK_URLS")
            .unwrap_or_default()
            .split(',')
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.trim().parse().expect("ALERT_WEBHOOK_URLS is invalid"))
            .collect(),
    };

    let commission = super::config_model::Commission {
        config_url: std::env::var("COMMISSION_CONFIG_URL").ok(),
        default_rate: std::env::var("COMMISSION_DEFAULT_RATE")
            .unwrap_or_else(|_| "0.15".to_string())
            .parse()?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        mercadopago,
        fx,
        alerts,
        commission,
    })
}
