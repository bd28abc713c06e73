#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub mercadopago: MercadoPago,
    pub fx: Fx,
    pub alerts: Alerts,
    pub commission: Commission,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
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
pub struct Fx {
    pub base_url: String,
    pub api_key: String,
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
