#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub database: Database,
    pub mercadopago: MercadoPago,
    pub alerts: Alerts,
    pub commission: Commission,
    pub schedule: Schedule,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct MercadoPago {
    pub base_url: String,
    pub access_token: String,
    pub webhook_secret: String,
    pub back_url: String,
}

#[derive(Debug, Clone)]
pub struct Alerts {
    pub webhook_urls: Vec<url::Url>,
}

#[derive(Debug, Clone)]
pub struct Commission {
    pub config_url: Option<String>,
    pub default_rate: f64,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    pub dlq_interval_seconds: u64,
    pub reconciliation_interval_seconds: u64,
    pub reconciliation_autofix: bool,
    pub reconciliation_window_days: i64,
}
