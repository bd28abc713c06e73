use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

/// Builds the error response for a usecase failure. Internal errors are
/// logged upstream and never leak detail to the client.
pub fn usecase_error(status: StatusCode, message: String) -> Response {
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "Internal server error".to_string()
    } else {
        message
    };

    let body = Json(ErrorResponse {
        code: status.as_u16(),
        message,
    });

    (status, body).into_response()
}
