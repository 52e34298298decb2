use crate::helpers::converters::{outcome_to_dto, payment_to_dto, reversal_to_dto};
use crate::helpers::errors::{compute_error_response, error_response, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{PaymentDto, PaymentReceiptDto, ReversalDto};
use compute::money::MAX_MONEY;
use compute::NewPayment;
use model::PaymentStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Request body for recording a payment against a receipt
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreatePaymentRequest {
    /// Remitted amount, must be positive
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    /// Payment method, e.g. "transfer" or "cash"
    #[validate(length(min = 1, max = 50))]
    pub method: String,
    /// Receipt the payment is applied to
    pub receipt_id: i32,
    /// Condominium the caller is acting for; must own the receipt when given
    pub condominium_id: Option<i32>,
    /// Free-form details kept alongside the reconciliation bookkeeping
    #[schema(value_type = Option<Object>)]
    pub payment_details: Option<Value>,
    /// Initial status (default: pending)
    pub status: Option<String>,
}

/// Request body for moving a payment through the approval workflow
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdatePaymentStatusRequest {
    /// One of `pending`, `verified`, `approved`, `rejected`
    #[validate(length(min = 1))]
    pub status: String,
}

pub(crate) fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        return Err(ValidationError::new("amount_not_positive"));
    }
    validate_money_capacity(amount)
}

pub(crate) fn validate_money_capacity(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount >= MAX_MONEY {
        return Err(ValidationError::new("amount_too_large"));
    }
    Ok(())
}

fn parse_status(raw: &str) -> Result<PaymentStatus, HandlerError> {
    raw.parse::<PaymentStatus>()
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, "INVALID_STATUS", e))
}

/// Record a payment and reconcile its receipt
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment created successfully", body = ApiResponse<PaymentReceiptDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Receipt not found", body = ErrorResponse),
        (status = 422, description = "Malformed request body"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_payment(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreatePaymentRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentReceiptDto>>), HandlerError> {
    trace!("Entering create_payment function");
    let status = match request.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => PaymentStatus::Pending,
    };
    debug!(
        "Creating {} payment of {} for receipt {}",
        status, request.amount, request.receipt_id
    );

    let new_payment = NewPayment {
        receipt_id: request.receipt_id,
        condominium_id: request.condominium_id,
        amount: request.amount,
        method: request.method,
        status,
        payment_details: request.payment_details,
    };

    let outcome = state
        .payments
        .create_payment(&state.db, new_payment)
        .await
        .map_err(compute_error_response)?;
    state.cache.invalidate(outcome.receipt.id).await;

    info!(
        "Payment {} created, receipt {} is now {}",
        outcome.payment.id, outcome.receipt.id, outcome.receipt.status
    );
    let response = ApiResponse {
        data: outcome_to_dto(&outcome),
        message: "Payment created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a payment by ID
#[utoipa::path(
    get,
    path = "/api/v1/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    responses(
        (status = 200, description = "Payment retrieved successfully", body = ApiResponse<PaymentDto>),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_payment(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentDto>>), HandlerError> {
    trace!("Entering get_payment function for payment_id: {}", payment_id);

    let payment = state
        .payments
        .get_payment(&state.db, payment_id)
        .await
        .map_err(compute_error_response)?;

    let response = ApiResponse {
        data: payment_to_dto(&payment),
        message: "Payment retrieved successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Change a payment's status and recompute its receipt
#[utoipa::path(
    put,
    path = "/api/v1/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment status updated successfully", body = ApiResponse<PaymentReceiptDto>),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 404, description = "Payment or receipt not found", body = ErrorResponse),
        (status = 409, description = "Payment already anuled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_payment_status(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdatePaymentStatusRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentReceiptDto>>), HandlerError> {
    trace!("Entering update_payment_status function for payment_id: {}", payment_id);
    let status = parse_status(&request.status)?;

    let outcome = state
        .payments
        .update_payment_status(&state.db, payment_id, status)
        .await
        .map_err(compute_error_response)?;
    state.cache.invalidate(outcome.receipt.id).await;

    info!(
        "Payment {} moved to {}, receipt {} is now {}",
        payment_id, status, outcome.receipt.id, outcome.receipt.status
    );
    let response = ApiResponse {
        data: outcome_to_dto(&outcome),
        message: "Payment status updated successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Anul a payment and take it off its receipt
#[utoipa::path(
    delete,
    path = "/api/v1/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    responses(
        (status = 200, description = "Payment anuled successfully", body = ApiResponse<ReversalDto>),
        (status = 404, description = "Payment or receipt not found", body = ErrorResponse),
        (status = 409, description = "Payment already anuled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_payment(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<ReversalDto>>), HandlerError> {
    trace!("Entering delete_payment function for payment_id: {}", payment_id);

    let outcome = state
        .payments
        .reverse_payment(&state.db, payment_id)
        .await
        .map_err(compute_error_response)?;
    state.cache.invalidate(outcome.receipt.id).await;

    info!(
        "Payment {} anuled, receipt {} is now {}",
        payment_id, outcome.receipt.id, outcome.receipt.status
    );
    let response = ApiResponse {
        data: reversal_to_dto(&outcome),
        message: "Payment anuled successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::OK, Json(response)))
}
