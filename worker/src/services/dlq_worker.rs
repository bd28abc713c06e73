use anyhow::Result;
use crates::application::usecases::dlq_processor::DlqProcessor;
use crates::infra::{
    alerts::webhook::WebhookAlertSink,
    db::repositories::{
        bookings::BookingPostgres, dlq::DlqPostgres, payment_intents::PaymentIntentPostgres,
    },
    payments::mercadopago_client::MercadoPagoClient,
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

pub type Processor = DlqProcessor<
    DlqPostgres,
    BookingPostgres,
    PaymentIntentPostgres,
    MercadoPagoClient,
    WebhookAlertSink,
>;

/// Periodic dead-letter sweep. An error aborts the iteration, never the loop.
pub async fn run(processor: Arc<Processor>, interval_seconds: u64) -> Result<()> {
    info!(interval_seconds, "dlq worker started");

    loop {
        match processor.process_due_items().await {
            Ok(summary) if summary.processed > 0 => {
                info!(
                    processed = summary.processed,
                    resolved = summary.resolved,
                    retrying = summary.retrying,
                    failed = summary.failed,
                    "dlq worker: sweep done"
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!("Error while processing dead-letter items: {}", e);
            }
        }

        tokio::time::sleep(Duration::from_secs(interval_seconds)).await;
    }
}
