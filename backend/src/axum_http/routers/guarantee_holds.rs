use crate::axum_http::error_responses::usecase_error;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use crates::{
    application::usecases::guarantee_holds::GuaranteeHoldService,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, card_holds::CardHoldPostgres,
            risk_snapshots::RiskSnapshotPostgres,
        },
    },
    infra::payments::mercadopago_client::MercadoPagoClient,
};
use std::sync::Arc;
use uuid::Uuid;

type HoldService = GuaranteeHoldService<
    BookingPostgres,
    CardHoldPostgres,
    RiskSnapshotPostgres,
    MercadoPagoClient,
>;

pub fn routes(db_pool: Arc<PgPoolSquad>, provider: Arc<MercadoPagoClient>) -> Router {
    let service = GuaranteeHoldService::new(
        Arc::new(BookingPostgres::new(Arc::clone(&db_pool))),
        Arc::new(CardHoldPostgres::new(Arc::clone(&db_pool))),
        Arc::new(RiskSnapshotPostgres::new(Arc::clone(&db_pool))),
        provider,
    );

    Router::new()
        .route("/:booking_id/place", post(place_hold))
        .route("/:booking_id/release", post(release_hold))
        .route("/:booking_id/capture", post(capture_hold))
        .with_state(Arc::new(service))
}

pub async fn place_hold(
    State(service): State<Arc<HoldService>>,
    Path(booking_id): Path<Uuid>,
) -> impl IntoResponse {
    match service.place_hold(booking_id).await {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(err) => usecase_error(err.status_code(), err.to_string()),
    }
}

pub async fn release_hold(
    State(service): State<Arc<HoldService>>,
    Path(booking_id): Path<Uuid>,
) -> impl IntoResponse {
    match service.release_hold(booking_id).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => usecase_error(err.status_code(), err.to_string()),
    }
}

pub async fn capture_hold(
    State(service): State<Arc<HoldService>>,
    Path(booking_id): Path<Uuid>,
) -> impl IntoResponse {
    match service.capture_hold(booking_id).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => usecase_error(err.status_code(), err.to_string()),
    }
}
