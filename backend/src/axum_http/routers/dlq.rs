use crate::axum_http::error_responses::usecase_error;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    application::usecases::dlq_processor::DlqProcessor,
    domain::{
        repositories::dlq::DlqRepository, value_objects::enums::dlq_statuses::DlqStatus,
    },
    infra::{
        alerts::webhook::WebhookAlertSink,
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{
                bookings::BookingPostgres, dlq::DlqPostgres,
                payment_intents::PaymentIntentPostgres,
            },
        },
        payments::mercadopago_client::MercadoPagoClient,
    },
};
use serde_json::json;
use std::sync::Arc;

type Processor = DlqProcessor<
    DlqPostgres,
    BookingPostgres,
    PaymentIntentPostgres,
    MercadoPagoClient,
    WebhookAlertSink,
>;

pub struct DlqState {
    processor: Processor,
    dlq_repo: Arc<DlqPostgres>,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    provider: Arc<MercadoPagoClient>,
    alerts: Arc<WebhookAlertSink>,
) -> Router {
    let dlq_repo = Arc::new(DlqPostgres::new(Arc::clone(&db_pool)));
    let processor = DlqProcessor::new(
        Arc::clone(&dlq_repo),
        Arc::new(BookingPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PaymentIntentPostgres::new(Arc::clone(&db_pool))),
        provider,
        alerts,
    );

    Router::new()
        .route("/process", post(process_due_items))
        .route("/stats", get(queue_stats))
        .with_state(Arc::new(DlqState {
            processor,
            dlq_repo,
        }))
}

pub async fn process_due_items(State(state): State<Arc<DlqState>>) -> impl IntoResponse {
    match state.processor.process_due_items().await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => usecase_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

pub async fn queue_stats(State(state): State<Arc<DlqState>>) -> impl IntoResponse {
    let counts = async {
        anyhow::Ok(json!({
            "pending": state.dlq_repo.count_by_status(DlqStatus::Pending).await?,
            "retrying": state.dlq_repo.count_by_status(DlqStatus::Retrying).await?,
            "resolved": state.dlq_repo.count_by_status(DlqStatus::Resolved).await?,
            "failed": state.dlq_repo.count_by_status(DlqStatus::Failed).await?,
        }))
    }
    .await;

    match counts {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => usecase_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}
