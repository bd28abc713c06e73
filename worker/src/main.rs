use anyhow::Result;
use crates::application::usecases::{
    dlq_processor::DlqProcessor, reconciliation::ReconciliationUseCase,
};
use crates::infra::{
    alerts::webhook::WebhookAlertSink,
    commission::remote_config::RemoteCommissionConfig,
    db::{
        postgres::postgres_connection,
        repositories::{
            bookings::BookingPostgres, card_holds::CardHoldPostgres, dlq::DlqPostgres,
            payment_intents::PaymentIntentPostgres, wallets::WalletPostgres,
        },
    },
    payments::mercadopago_client::MercadoPagoClient,
};
use std::sync::Arc;
use tracing::{error, info};
use worker::{config, services};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    // Repositories on the shared pool
    let booking_repository = Arc::new(BookingPostgres::new(Arc::clone(&db_pool_arc)));
    let intent_repository = Arc::new(PaymentIntentPostgres::new(Arc::clone(&db_pool_arc)));
    let wallet_repository = Arc::new(WalletPostgres::new(Arc::clone(&db_pool_arc)));
    let card_hold_repository = Arc::new(CardHoldPostgres::new(Arc::clone(&db_pool_arc)));
    let dlq_repository = Arc::new(DlqPostgres::new(Arc::clone(&db_pool_arc)));

    let provider = Arc::new(MercadoPagoClient::new(
        dotenvy_env.mercadopago.base_url.clone(),
        dotenvy_env.mercadopago.access_token.clone(),
        dotenvy_env.mercadopago.webhook_secret.clone(),
        dotenvy_env.mercadopago.back_url.clone(),
    ));
    let alerts = Arc::new(WebhookAlertSink::new(dotenvy_env.alerts.webhook_urls.clone()));
    let commission_source = Arc::new(RemoteCommissionConfig::new(
        dotenvy_env.commission.config_url.clone(),
        dotenvy_env.commission.default_rate,
    ));

    let dlq_processor = Arc::new(DlqProcessor::new(
        Arc::clone(&dlq_repository),
        Arc::clone(&booking_repository),
        Arc::clone(&intent_repository),
        Arc::clone(&provider),
        Arc::clone(&alerts),
    ));

    let reconciliation = Arc::new(ReconciliationUseCase::new(
        booking_repository,
        intent_repository,
        wallet_repository,
        card_hold_repository,
        dlq_repository,
        provider,
        commission_source,
        alerts,
    ));

    let dlq_loop = tokio::spawn(services::dlq_worker::run(
        dlq_processor,
        dotenvy_env.schedule.dlq_interval_seconds,
    ));

    let reconciliation_loop = tokio::spawn(services::reconciliation_worker::run(
        reconciliation,
        dotenvy_env.schedule.reconciliation_interval_seconds,
        dotenvy_env.schedule.reconciliation_autofix,
        dotenvy_env.schedule.reconciliation_window_days,
    ));

    tokio::select! {
        result = dlq_loop => result??,
        result = reconciliation_loop => result??,
    };
    Ok(())
}
