use crate::axum_http::error_responses::usecase_error;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use crates::{
    application::usecases::risk::RiskSnapshotUseCase,
    domain::value_objects::enums::{
        coverage_upgrades::CoverageUpgrade, pricing_buckets::PricingBucket,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::risk_snapshots::RiskSnapshotPostgres,
    },
    infra::fx::fx_client::FxClient,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

type RiskUseCase = RiskSnapshotUseCase<RiskSnapshotPostgres, FxClient>;

#[derive(Debug, Deserialize)]
pub struct CreateSnapshotRequest {
    pub booking_id: Uuid,
    pub vehicle_value_usd: f64,
    pub pricing_bucket: String,
    pub coverage_upgrade: String,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, fx_provider: Arc<FxClient>) -> Router {
    let usecase = RiskSnapshotUseCase::new(
        Arc::new(RiskSnapshotPostgres::new(Arc::clone(&db_pool))),
        fx_provider,
    );

    Router::new()
        .route("/snapshot", post(create_snapshot))
        .with_state(Arc::new(usecase))
}

pub async fn create_snapshot(
    State(usecase): State<Arc<RiskUseCase>>,
    Json(request): Json<CreateSnapshotRequest>,
) -> impl IntoResponse {
    let Some(pricing_bucket) = PricingBucket::from_str(&request.pricing_bucket) else {
        return usecase_error(
            StatusCode::BAD_REQUEST,
            format!("unknown pricing bucket: {}", request.pricing_bucket),
        );
    };
    let Some(coverage_upgrade) = CoverageUpgrade::from_str(&request.coverage_upgrade) else {
        return usecase_error(
            StatusCode::BAD_REQUEST,
            format!("unknown coverage upgrade: {}", request.coverage_upgrade),
        );
    };

    match usecase
        .create_snapshot(
            request.booking_id,
            request.vehicle_value_usd,
            pricing_bucket,
            coverage_upgrade,
        )
        .await
    {
        Ok(snapshot) => (StatusCode::CREATED, Json(snapshot)).into_response(),
        Err(err) => usecase_error(err.status_code(), err.to_string()),
    }
}
