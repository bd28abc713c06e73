use anyhow::Result;
use crates::application::usecases::reconciliation::ReconciliationUseCase;
use crates::infra::{
    alerts::webhook::WebhookAlertSink,
    commission::remote_config::RemoteCommissionConfig,
    db::repositories::{
        bookings::BookingPostgres, card_holds::CardHoldPostgres, dlq::DlqPostgres,
        payment_intents::PaymentIntentPostgres, wallets::WalletPostgres,
    },
    payments::mercadopago_client::MercadoPagoClient,
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

pub type Sweep = ReconciliationUseCase<
    BookingPostgres,
    PaymentIntentPostgres,
    WalletPostgres,
    CardHoldPostgres,
    DlqPostgres,
    MercadoPagoClient,
    RemoteCommissionConfig,
    WebhookAlertSink,
>;

pub async fn run(
    sweep: Arc<Sweep>,
    interval_seconds: u64,
    autofix: bool,
    window_days: i64,
) -> Result<()> {
    info!(interval_seconds, autofix, "reconciliation worker started");

    loop {
        match sweep.run(autofix, window_days).await {
            Ok(report) => {
                info!(
                    overall_status = %report.overall_status,
                    total_issues = report.total_issues,
                    total_fixed = report.total_fixed,
                    "reconciliation worker: sweep done"
                );
            }
            Err(e) => {
                error!("Error while running reconciliation sweep: {}", e);
            }
        }

        tokio::time::sleep(Duration::from_secs(interval_seconds)).await;
    }
}
