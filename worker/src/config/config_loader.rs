use anyhow::{Ok, Result};

use super::config_model::DotEnvyConfig;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

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

    let schedule = super::config_model::Schedule {
        dlq_interval_seconds: std::env::var("WORKER_DLQ_INTERVAL_SECONDS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()?,
        reconciliation_interval_seconds: std::env::var("WORKER_RECONCILIATION_INTERVAL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()?,
        reconciliation_autofix: std::env::var("WORKER_RECONCILIATION_AUTOFIX")
            .unwrap_or_else(|_| "false".to_string())
            .parse()?,
        reconciliation_window_days: std::env::var("WORKER_RECONCILIATION_WINDOW_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()?,
    };

    Ok(DotEnvyConfig {
        database,
        mercadopago,
        alerts,
        commission,
        schedule,
    })
}
