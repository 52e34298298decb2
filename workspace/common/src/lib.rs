//! Common transport-layer types shared between the server and its clients.
//! These structs mirror the handlers' response payloads so a client can
//! deserialize API responses without duplicating shapes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Generic API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

// ===================== Receipts =====================

/// Receipt state as exposed over the API.
///
/// Monetary values are serialized as decimal strings with two places.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReceiptDto {
    pub id: i32,
    pub condominium_id: i32,
    pub property_id: i32,
    /// Billing period label, e.g. "2024-03"
    pub period: String,
    /// Total owed
    pub amount: Decimal,
    /// Stored outstanding balance; `null` until the first reconciliation
    pub pending_amount: Option<Decimal>,
    /// What is actually owed right now
    pub outstanding: Decimal,
    /// Overpayment carried forward
    pub credit_balance: Decimal,
    /// Credit carried in when the receipt was issued
    pub opening_credit: Decimal,
    /// One of `pending`, `partial`, `paid`, `anuled`
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ===================== Payments =====================

/// Payment as exposed over the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PaymentDto {
    pub id: i32,
    pub receipt_id: i32,
    pub condominium_id: i32,
    pub amount: Decimal,
    /// Free-form method, e.g. "transfer"
    pub method: String,
    /// One of `pending`, `verified`, `approved`, `rejected`, `anuled`
    pub status: String,
    /// Reconciliation bookkeeping plus any caller-supplied keys
    #[schema(value_type = Object)]
    pub payment_details: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payment together with the receipt state it produced.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PaymentReceiptDto {
    pub payment: PaymentDto,
    pub receipt: ReceiptDto,
    /// Receipt credit drawn by this payment when it was created
    pub credit_applied: Decimal,
}

/// Result of soft-deleting a payment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReversalDto {
    pub payment: PaymentDto,
    pub receipt: ReceiptDto,
    /// Credit absorbed by the reversal; negative when credit was released
    pub credit_adjustment: Decimal,
}
