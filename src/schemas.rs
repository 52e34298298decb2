use common::{PaymentDto, PaymentReceiptDto, ReceiptDto, ReversalDto};
use compute::PaymentService;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::{OpenApi, ToSchema};

pub use common::ApiResponse;

use crate::handlers::payments::{CreatePaymentRequest, UpdatePaymentStatusRequest};
use crate::handlers::receipts::CreateReceiptRequest;
use crate::helpers::cache::ReceiptCache;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Receipt reads, keyed by receipt id
    pub cache: ReceiptCache,
    /// Reconciliation entry points
    pub payments: PaymentService,
    /// Per-request timeout applied by the router
    pub request_timeout: Duration,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
    /// Active reconciliation strategy
    pub reconciliation: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::payments::create_payment,
        crate::handlers::payments::get_payment,
        crate::handlers::payments::update_payment_status,
        crate::handlers::payments::delete_payment,
        crate::handlers::receipts::create_receipt,
        crate::handlers::receipts::get_receipt,
        crate::handlers::receipts::get_receipt_payments,
    ),
    components(
        schemas(
            ApiResponse<PaymentReceiptDto>,
            ApiResponse<ReversalDto>,
            ApiResponse<PaymentDto>,
            ApiResponse<ReceiptDto>,
            ApiResponse<Vec<PaymentDto>>,
            ErrorResponse,
            HealthResponse,
            CreatePaymentRequest,
            UpdatePaymentStatusRequest,
            CreateReceiptRequest,
            PaymentDto,
            ReceiptDto,
            PaymentReceiptDto,
            ReversalDto,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "payments", description = "Payment creation, approval and reversal"),
        (name = "receipts", description = "Receipt issuing and balances"),
    ),
    info(
        title = "Condofin API",
        description = "Condominium billing API keeping receipts reconciled with their payments",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
