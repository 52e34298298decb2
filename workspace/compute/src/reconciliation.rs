//! Receipt reconciliation: keeps a receipt's `pending_amount`,
//! `credit_balance` and `status` consistent with the payments made against it.
//!
//! Everything in here is pure. Loading the receipt and its payments and
//! persisting the outcome is the job of [`crate::payments::PaymentService`].

use model::entities::{payment, receipt};
use model::{PaymentStatus, ReceiptStatus};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{ComputeError, Result};
use crate::money::{non_negative, round_money};

pub mod incremental;
pub mod ledger;

pub use incremental::IncrementalReconciler;
pub use ledger::LedgerReconciler;

/// Financial state of a receipt as read from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptState {
    pub amount: Decimal,
    /// `None` when the receipt was never reconciled.
    pub pending_amount: Option<Decimal>,
    pub credit_balance: Decimal,
    pub opening_credit: Decimal,
}

impl ReceiptState {
    /// Outstanding balance, reading an uninitialized receipt as fully owed.
    pub fn outstanding(&self) -> Decimal {
        round_money(self.pending_amount.unwrap_or(self.amount))
    }
}

impl From<&receipt::Model> for ReceiptState {
    fn from(model: &receipt::Model) -> Self {
        Self {
            amount: round_money(model.amount),
            pending_amount: model.pending_amount.map(round_money),
            credit_balance: round_money(model.credit_balance),
            opening_credit: round_money(model.opening_credit),
        }
    }
}

/// One payment as seen by reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub payment_id: i32,
    pub amount: Decimal,
    pub status: PaymentStatus,
    /// Credit drawn from the receipt when the payment was created.
    pub credit_applied: Decimal,
}

impl From<&payment::Model> for LedgerEntry {
    fn from(model: &payment::Model) -> Self {
        Self {
            payment_id: model.id,
            amount: round_money(model.amount),
            status: model.status,
            credit_applied: round_money(model.details().credit_applied()),
        }
    }
}

/// The three derived receipt fields after a reconciliation step.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledReceipt {
    pub pending_amount: Decimal,
    pub credit_balance: Decimal,
    pub status: ReceiptStatus,
}

impl ReconciledReceipt {
    /// Clamp both balances at zero and round them for persistence.
    pub(crate) fn settle(pending_amount: Decimal, credit_balance: Decimal, status: ReceiptStatus) -> Self {
        Self {
            pending_amount: round_money(non_negative(pending_amount)),
            credit_balance: round_money(non_negative(credit_balance)),
            status,
        }
    }

    /// Fail when a balance outgrows what a money column can hold.
    pub(crate) fn ensure_storable(self) -> Result<Self> {
        crate::money::ensure_storable(self.pending_amount)?;
        crate::money::ensure_storable(self.credit_balance)?;
        Ok(self)
    }
}

/// Outcome of applying a new payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentApplication {
    pub receipt: ReconciledReceipt,
    pub original_amount: Decimal,
    pub credit_applied: Decimal,
    pub remaining_amount: Decimal,
    pub new_credit_balance: Decimal,
}

/// Outcome of changing a payment's status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub receipt: ReconciledReceipt,
    pub verified_amount: Decimal,
    pub total_verified: Decimal,
    pub credit_applied: Decimal,
    pub remaining_amount: Decimal,
}

/// Outcome of reversing (soft-deleting) a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Reversal {
    pub receipt: ReconciledReceipt,
    /// Credit absorbed by the reversal. Negative when credit was released.
    pub credit_adjustment: Decimal,
}

/// The three payment lifecycle entry points.
///
/// `ledger` is every payment currently recorded against the receipt,
/// including the one being changed or reversed (with its stored status).
pub trait ReceiptReconciler: fmt::Debug + Send + Sync {
    /// Short name used in logs and the health report.
    fn name(&self) -> &'static str;

    fn apply_payment(
        &self,
        receipt: &ReceiptState,
        ledger: &[LedgerEntry],
        amount: Decimal,
        status: PaymentStatus,
    ) -> Result<PaymentApplication>;

    fn change_status(
        &self,
        receipt: &ReceiptState,
        ledger: &[LedgerEntry],
        target: &LedgerEntry,
        new_status: PaymentStatus,
    ) -> Result<StatusChange>;

    fn reverse_payment(
        &self,
        receipt: &ReceiptState,
        ledger: &[LedgerEntry],
        target: &LedgerEntry,
    ) -> Result<Reversal>;
}

/// Status from an outstanding balance: nothing owed is `paid`, less than the
/// full amount is `partial`, anything else is `pending`.
pub fn derive_status(pending_amount: Decimal, amount: Decimal) -> ReceiptStatus {
    if pending_amount <= Decimal::ZERO {
        ReceiptStatus::Paid
    } else if pending_amount < amount {
        ReceiptStatus::Partial
    } else {
        ReceiptStatus::Pending
    }
}

/// New payments can start in any state except soft-deleted.
pub(crate) fn ensure_creatable(status: PaymentStatus) -> Result<()> {
    if status == PaymentStatus::Anuled {
        return Err(ComputeError::InvalidStatus(
            "a payment cannot be created as anuled".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_status_change(target: &LedgerEntry, new_status: PaymentStatus) -> Result<()> {
    if target.status == PaymentStatus::Anuled {
        return Err(ComputeError::AlreadyReversed(target.payment_id));
    }
    if new_status == PaymentStatus::Anuled {
        return Err(ComputeError::InvalidStatus(
            "use the reversal entry point to anul a payment".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_reversible(target: &LedgerEntry) -> Result<()> {
    if target.status == PaymentStatus::Anuled {
        return Err(ComputeError::AlreadyReversed(target.payment_id));
    }
    Ok(())
}

/// Which reconciler the service runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconciliationStrategy {
    /// Per-event delta adjustments, the historical behavior.
    #[default]
    Incremental,
    /// Full recompute from the payment ledger on every event.
    Ledger,
}

impl ReconciliationStrategy {
    pub fn reconciler(&self) -> Box<dyn ReceiptReconciler> {
        match self {
            ReconciliationStrategy::Incremental => Box::new(IncrementalReconciler),
            ReconciliationStrategy::Ledger => Box::new(LedgerReconciler),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationStrategy::Incremental => "incremental",
            ReconciliationStrategy::Ledger => "ledger",
        }
    }
}

impl fmt::Display for ReconciliationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReconciliationStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incremental" => Ok(ReconciliationStrategy::Incremental),
            "ledger" => Ok(ReconciliationStrategy::Ledger),
            _ => Err(format!("Unknown reconciliation strategy: {}", s)),
        }
    }
}
