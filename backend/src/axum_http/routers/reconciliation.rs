use crate::axum_http::error_responses::usecase_error;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use crates::{
    application::usecases::reconciliation::ReconciliationUseCase,
    domain::value_objects::reconciliation::OverallStatus,
    infra::{
        alerts::webhook::WebhookAlertSink,
        commission::remote_config::RemoteCommissionConfig,
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{
                bookings::BookingPostgres, card_holds::CardHoldPostgres, dlq::DlqPostgres,
                payment_intents::PaymentIntentPostgres, wallets::WalletPostgres,
            },
        },
        payments::mercadopago_client::MercadoPagoClient,
    },
};
use serde::Deserialize;
use std::sync::Arc;

type ReconUseCase = ReconciliationUseCase<
    BookingPostgres,
    PaymentIntentPostgres,
    WalletPostgres,
    CardHoldPostgres,
    DlqPostgres,
    MercadoPagoClient,
    RemoteCommissionConfig,
    WebhookAlertSink,
>;

#[derive(Debug, Deserialize)]
pub struct RunParams {
    #[serde(default)]
    pub autofix: bool,
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    7
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    provider: Arc<MercadoPagoClient>,
    commission_source: Arc<RemoteCommissionConfig>,
    alerts: Arc<WebhookAlertSink>,
) -> Router {
    let usecase = ReconciliationUseCase::new(
        Arc::new(BookingPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PaymentIntentPostgres::new(Arc::clone(&db_pool))),
        Arc::new(WalletPostgres::new(Arc::clone(&db_pool))),
        Arc::new(CardHoldPostgres::new(Arc::clone(&db_pool))),
        Arc::new(DlqPostgres::new(Arc::clone(&db_pool))),
        provider,
        commission_source,
        alerts,
    );

    Router::new()
        .route("/run", post(run_sweep))
        .with_state(Arc::new(usecase))
}

pub async fn run_sweep(
    State(usecase): State<Arc<ReconUseCase>>,
    Query(params): Query<RunParams>,
) -> impl IntoResponse {
    match usecase.run(params.autofix, params.days).await {
        Ok(report) => {
            // A critical report still carries its body so the caller sees
            // which checks went wrong.
            let status = if report.overall_status == OverallStatus::Critical {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            (status, Json(report)).into_response()
        }
        Err(err) => usecase_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_params_accept_days_and_autofix() {
        let params: RunParams =
            serde_json::from_value(serde_json::json!({ "autofix": true, "days": 30 })).unwrap();

        assert!(params.autofix);
        assert_eq!(params.days, 30);
    }

    #[test]
    fn run_params_default_to_a_week_without_autofix() {
        let params: RunParams = serde_json::from_value(serde_json::json!({})).unwrap();

        assert!(!params.autofix);
        assert_eq!(params.days, 7);
    }
}
