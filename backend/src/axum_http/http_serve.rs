use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::infra::{
    self,
    alerts::webhook::WebhookAlertSink,
    commission::remote_config::RemoteCommissionConfig,
    fx::fx_client::FxClient,
    payments::mercadopago_client::MercadoPagoClient,
};
use infra::db::postgres::postgres_connection::PgPoolSquad;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let provider = Arc::new(MercadoPagoClient::new(
        config.mercadopago.base_url.clone(),
        config.mercadopago.access_token.clone(),
        config.mercadopago.webhook_secret.clone(),
        config.mercadopago.back_url.clone(),
    ));
    let fx_provider = Arc::new(FxClient::new(
        config.fx.base_url.clone(),
        config.fx.api_key.clone(),
    ));
    let alerts = Arc::new(WebhookAlertSink::new(config.alerts.webhook_urls.clone()));
    let commission_source = Arc::new(RemoteCommissionConfig::new(
        config.commission.config_url.clone(),
        config.commission.default_rate,
    ));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/payments",
            routers::payments::routes(
                Arc::clone(&db_pool),
                Arc::clone(&provider),
                Arc::clone(&fx_provider),
            ),
        )
        .nest(
            "/api/v1/risk",
            routers::risk::routes(Arc::clone(&db_pool), Arc::clone(&fx_provider)),
        )
        .nest(
            "/api/v1/holds",
            routers::guarantee_holds::routes(Arc::clone(&db_pool), Arc::clone(&provider)),
        )
        .nest(
            "/api/v1/reconciliation",
            routers::reconciliation::routes(
                Arc::clone(&db_pool),
                Arc::clone(&provider),
                Arc::clone(&commission_source),
                Arc::clone(&alerts),
            ),
        )
        .nest(
            "/api/v1/dlq",
            routers::dlq::routes(Arc::clone(&db_pool), Arc::clone(&provider), Arc::clone(&alerts)),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any), // TODO Add the domain later
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdow_signal())
        .await?;

    Ok(())
}

async fn shutdow_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
