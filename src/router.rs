use crate::handlers::{
    health::health_check,
    payments::{create_payment, delete_payment, get_payment, update_payment_status},
    receipts::{create_receipt, get_receipt, get_receipt_payments},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout;

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Payment lifecycle
        .route("/api/v1/payments", post(create_payment))
        .route(
            "/api/v1/payments/:payment_id",
            get(get_payment).put(update_payment_status).delete(delete_payment),
        )
        // Receipts
        .route("/api/v1/receipts", post(create_receipt))
        .route("/api/v1/receipts/:receipt_id", get(get_receipt))
        .route("/api/v1/receipts/:receipt_id/payments", get(get_receipt_payments))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
