use crate::handlers::payments::{validate_money_capacity, validate_positive_amount};
use crate::helpers::converters::{payment_to_dto, receipt_to_dto};
use crate::helpers::errors::{compute_error_response, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{PaymentDto, ReceiptDto};
use compute::NewReceipt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Request body for issuing a receipt
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateReceiptRequest {
    /// Property being billed
    pub property_id: i32,
    /// Billing period label, e.g. "2024-03"
    #[validate(length(min = 1, max = 20))]
    pub period: String,
    /// Amount owed, must be positive
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    /// Credit carried in from earlier receipts (default: 0)
    #[validate(custom(function = "validate_non_negative_amount"))]
    pub opening_credit: Option<Decimal>,
}

fn validate_non_negative_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount < Decimal::ZERO {
        return Err(ValidationError::new("amount_negative"));
    }
    validate_money_capacity(amount)
}

/// Issue a receipt for a property
#[utoipa::path(
    post,
    path = "/api/v1/receipts",
    tag = "receipts",
    request_body = CreateReceiptRequest,
    responses(
        (status = 201, description = "Receipt created successfully", body = ApiResponse<ReceiptDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_receipt(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateReceiptRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<ReceiptDto>>), HandlerError> {
    trace!("Entering create_receipt function");

    let receipt = state
        .payments
        .issue_receipt(
            &state.db,
            NewReceipt {
                property_id: request.property_id,
                period: request.period,
                amount: request.amount,
                opening_credit: request.opening_credit.unwrap_or(Decimal::ZERO),
            },
        )
        .await
        .map_err(compute_error_response)?;

    info!("Receipt {} issued for property {}", receipt.id, receipt.property_id);
    let response = ApiResponse {
        data: receipt_to_dto(&receipt),
        message: "Receipt created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a receipt's current balances
#[utoipa::path(
    get,
    path = "/api/v1/receipts/{receipt_id}",
    tag = "receipts",
    params(
        ("receipt_id" = i32, Path, description = "Receipt ID"),
    ),
    responses(
        (status = 200, description = "Receipt retrieved successfully", body = ApiResponse<ReceiptDto>),
        (status = 404, description = "Receipt not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_receipt(
    Path(receipt_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<ReceiptDto>>), HandlerError> {
    trace!("Entering get_receipt function for receipt_id: {}", receipt_id);

    let data = match state.cache.get(receipt_id).await {
        Some(cached) => {
            debug!("Serving receipt {} from cache", receipt_id);
            cached
        }
        None => {
            let generation = state.cache.generation();
            let receipt = state
                .payments
                .get_receipt(&state.db, receipt_id)
                .await
                .map_err(compute_error_response)?;
            let dto = receipt_to_dto(&receipt);
            state.cache.store_read(dto.clone(), generation).await;
            dto
        }
    };

    let response = ApiResponse {
        data,
        message: "Receipt retrieved successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// List every payment recorded against a receipt, anuled ones included
#[utoipa::path(
    get,
    path = "/api/v1/receipts/{receipt_id}/payments",
    tag = "receipts",
    params(
        ("receipt_id" = i32, Path, description = "Receipt ID"),
    ),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<PaymentDto>>),
        (status = 404, description = "Receipt not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_receipt_payments(
    Path(receipt_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<PaymentDto>>>), HandlerError> {
    trace!("Entering get_receipt_payments function for receipt_id: {}", receipt_id);

    let payments = state
        .payments
        .list_receipt_payments(&state.db, receipt_id)
        .await
        .map_err(compute_error_response)?;
    debug!("Receipt {} has {} payments", receipt_id, payments.len());

    let response = ApiResponse {
        data: payments.iter().map(payment_to_dto).collect(),
        message: "Payments retrieved successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::OK, Json(response)))
}
