//! Delta reconciliation. Creation and reversal adjust the stored balances in
//! place; status changes recompute `pending_amount` from approved payments
//! but leave `credit_balance` where creation and reversal put it.

use model::{PaymentStatus, ReceiptStatus};
use rust_decimal::Decimal;
use tracing::debug;

use super::{
    derive_status, ensure_creatable, ensure_reversible, ensure_status_change, LedgerEntry,
    PaymentApplication, ReceiptReconciler, ReceiptState, ReconciledReceipt, Reversal, StatusChange,
};
use crate::error::Result;
use crate::money::{non_negative, round_money, validate_amount};

#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementalReconciler;

impl ReceiptReconciler for IncrementalReconciler {
    fn name(&self) -> &'static str {
        "incremental"
    }

    fn apply_payment(
        &self,
        receipt: &ReceiptState,
        _ledger: &[LedgerEntry],
        amount: Decimal,
        status: PaymentStatus,
    ) -> Result<PaymentApplication> {
        ensure_creatable(status)?;
        let amount = validate_amount(amount)?;

        let mut remaining = receipt.outstanding() - amount;
        let mut credit_balance = receipt.credit_balance;
        let mut credit_applied = Decimal::ZERO;

        if credit_balance > Decimal::ZERO && remaining > Decimal::ZERO {
            credit_applied = credit_balance.min(remaining);
            remaining -= credit_applied;
            credit_balance -= credit_applied;
        }

        if remaining < Decimal::ZERO {
            credit_balance += remaining.abs();
            remaining = Decimal::ZERO;
        }

        debug!(
            "Applied payment of {}: remaining {}, credit applied {}, credit balance {}",
            amount, remaining, credit_applied, credit_balance
        );

        let reconciled = ReconciledReceipt::settle(remaining, credit_balance, derive_status(remaining, receipt.amount))
            .ensure_storable()?;
        Ok(PaymentApplication {
            original_amount: amount,
            credit_applied: round_money(credit_applied),
            remaining_amount: reconciled.pending_amount,
            new_credit_balance: reconciled.credit_balance,
            receipt: reconciled,
        })
    }

    fn change_status(
        &self,
        receipt: &ReceiptState,
        ledger: &[LedgerEntry],
        target: &LedgerEntry,
        new_status: PaymentStatus,
    ) -> Result<StatusChange> {
        ensure_status_change(target, new_status)?;

        // Only other approved payments count; the target counts whatever its new status.
        let other_approved: Decimal = ledger
            .iter()
            .filter(|entry| entry.payment_id != target.payment_id && entry.status == PaymentStatus::Approved)
            .map(|entry| entry.amount)
            .sum();
        let total_available = other_approved + target.amount + target.credit_applied;
        let pending = non_negative(receipt.amount - total_available);

        debug!(
            "Payment {} -> {}: other approved {}, total available {}, pending {}",
            target.payment_id, new_status, other_approved, total_available, pending
        );

        let reconciled = ReconciledReceipt::settle(pending, receipt.credit_balance, derive_status(pending, receipt.amount));
        Ok(StatusChange {
            verified_amount: target.amount,
            total_verified: round_money(total_available),
            credit_applied: target.credit_applied,
            remaining_amount: reconciled.pending_amount,
            receipt: reconciled,
        })
    }

    fn reverse_payment(
        &self,
        receipt: &ReceiptState,
        _ledger: &[LedgerEntry],
        target: &LedgerEntry,
    ) -> Result<Reversal> {
        ensure_reversible(target)?;

        let mut pending = receipt.outstanding() + target.amount;
        let mut credit_balance = receipt.credit_balance;
        let mut credit_adjustment = Decimal::ZERO;

        if credit_balance > Decimal::ZERO {
            credit_adjustment = credit_balance.min(target.amount);
            credit_balance -= credit_adjustment;
            pending -= credit_adjustment;
        }

        // Restores at most the full amount, even when an earlier recompute
        // already dropped part of what this payment covered.
        pending = pending.min(receipt.amount);

        // Reversal never reports `partial`.
        let status = if pending <= Decimal::ZERO {
            ReceiptStatus::Paid
        } else {
            ReceiptStatus::Pending
        };

        debug!(
            "Reversed payment {}: pending {}, credit adjustment {}",
            target.payment_id, pending, credit_adjustment
        );

        Ok(Reversal {
            receipt: ReconciledReceipt::settle(pending, credit_balance, status),
            credit_adjustment: round_money(credit_adjustment),
        })
    }
}
