pub mod error;
pub mod money;
pub mod payments;
pub mod reconciliation;

#[cfg(test)]
mod testing;

pub use payments::{NewPayment, NewReceipt, PaymentOutcome, PaymentService, ReversalOutcome};
pub use reconciliation::ReconciliationStrategy;

/// Returns the payment service used by the server for the given strategy.
///
/// `None` selects the default incremental reconciler.
pub fn default_service(strategy: Option<ReconciliationStrategy>) -> PaymentService {
    PaymentService::with_strategy(strategy.unwrap_or_default())
}
