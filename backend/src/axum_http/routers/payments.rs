use crate::axum_http::error_responses::usecase_error;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    application::usecases::payment_orchestrator::PaymentOrchestrator,
    domain::{
        repositories::wallets::WalletRepository,
        value_objects::payments::{BookingPaymentParams, RefundParams},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, dlq::DlqPostgres, payment_intents::PaymentIntentPostgres,
            wallets::WalletPostgres,
        },
    },
    infra::{fx::fx_client::FxClient, payments::mercadopago_client::MercadoPagoClient},
};
use std::sync::Arc;
use uuid::Uuid;

type Orchestrator = PaymentOrchestrator<
    BookingPostgres,
    PaymentIntentPostgres,
    WalletPostgres,
    DlqPostgres,
    MercadoPagoClient,
    FxClient,
>;

pub struct PaymentsState {
    orchestrator: Orchestrator,
    wallet_repo: Arc<WalletPostgres>,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    provider: Arc<MercadoPagoClient>,
    fx_provider: Arc<FxClient>,
) -> Router {
    let wallet_repo = Arc::new(WalletPostgres::new(Arc::clone(&db_pool)));
    let orchestrator = PaymentOrchestrator::new(
        Arc::new(BookingPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PaymentIntentPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&wallet_repo),
        Arc::new(DlqPostgres::new(Arc::clone(&db_pool))),
        provider,
        fx_provider,
    );

    Router::new()
        .route("/process", post(process_payment))
        .route("/refund", post(process_refund))
        .route("/webhook", post(payment_webhook))
        .route("/wallet/:user_id/balance", get(wallet_balance))
        .with_state(Arc::new(PaymentsState {
            orchestrator,
            wallet_repo,
        }))
}

pub async fn process_payment(
    State(state): State<Arc<PaymentsState>>,
    Json(params): Json<BookingPaymentParams>,
) -> impl IntoResponse {
    match state.orchestrator.process_booking_payment(params).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => usecase_error(err.status_code(), err.to_string()),
    }
}

pub async fn process_refund(
    State(state): State<Arc<PaymentsState>>,
    Json(params): Json<RefundParams>,
) -> impl IntoResponse {
    match state.orchestrator.process_refund(params).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => usecase_error(err.status_code(), err.to_string()),
    }
}

/// Raw-body handler: the signature is computed over the exact bytes the
/// provider sent, so the payload must not pass through a Json extractor.
pub async fn payment_webhook(
    State(state): State<Arc<PaymentsState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature_header = headers
        .get("x-signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    match state
        .orchestrator
        .handle_payment_webhook(&body, signature_header)
        .await
    {
        Ok(()) => StatusCode::OK.into_response(),
        // A processing failure is already parked in the dead-letter queue;
        // the 5xx also asks the provider to retry on its side.
        Err(err) => usecase_error(err.status_code(), err.to_string()),
    }
}

pub async fn wallet_balance(
    State(state): State<Arc<PaymentsState>>,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.wallet_repo.get_balance(user_id).await {
        Ok(balance) => (StatusCode::OK, Json(balance)).into_response(),
        Err(err) => usecase_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}
