use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The receipt id does not resolve
    #[error("Receipt with id {0} does not exist")]
    ReceiptNotFound(i32),

    /// The payment id does not resolve
    #[error("Payment with id {0} does not exist")]
    PaymentNotFound(i32),

    /// The property id does not resolve
    #[error("Property with id {0} does not exist")]
    PropertyNotFound(i32),

    /// Amount is zero, negative or otherwise unusable
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Status transition that no entry point accepts
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Caller supplied a payment_details bag that is not a JSON object
    #[error("Invalid payment details: {0}")]
    InvalidDetails(String),

    /// Payment submitted under a different condominium than its receipt
    #[error("Receipt {receipt} does not belong to condominium {condominium}")]
    CondominiumMismatch { receipt: i32, condominium: i32 },

    /// The payment was already soft-deleted
    #[error("Payment with id {0} is already anuled")]
    AlreadyReversed(i32),
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
