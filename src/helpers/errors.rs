use axum::{http::StatusCode, response::Json};
use compute::error::ComputeError;
use tracing::{error, warn};

use crate::schemas::ErrorResponse;

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, code: &str, error: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Map a service failure onto the HTTP error contract.
pub fn compute_error_response(err: ComputeError) -> HandlerError {
    let (status, code) = match &err {
        ComputeError::ReceiptNotFound(_) => (StatusCode::NOT_FOUND, "RECEIPT_NOT_FOUND"),
        ComputeError::PaymentNotFound(_) => (StatusCode::NOT_FOUND, "PAYMENT_NOT_FOUND"),
        ComputeError::PropertyNotFound(_) => (StatusCode::NOT_FOUND, "PROPERTY_NOT_FOUND"),
        ComputeError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
        ComputeError::InvalidStatus(_) => (StatusCode::BAD_REQUEST, "INVALID_STATUS"),
        ComputeError::InvalidDetails(_) => (StatusCode::BAD_REQUEST, "INVALID_DETAILS"),
        ComputeError::CondominiumMismatch { .. } => (StatusCode::BAD_REQUEST, "CONDOMINIUM_MISMATCH"),
        ComputeError::AlreadyReversed(_) => (StatusCode::CONFLICT, "ALREADY_REVERSED"),
        ComputeError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
    };

    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }
    error_response(status, code, err.to_string())
}
