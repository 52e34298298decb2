//! Full recompute from the payment ledger. Every entry point rebuilds the
//! receipt's derived fields from its opening credit and its live payments, so
//! the stored balances can never drift from the payments that justify them.

use model::PaymentStatus;
use rust_decimal::Decimal;
use tracing::debug;

use super::{
    derive_status, ensure_creatable, ensure_reversible, ensure_status_change, LedgerEntry,
    PaymentApplication, ReceiptReconciler, ReceiptState, ReconciledReceipt, Reversal, StatusChange,
};
use crate::error::Result;
use crate::money::{non_negative, round_money, validate_amount};

#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerReconciler;

/// Running totals over the live part of a ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Coverage {
    /// Opening credit already drawn by live payments.
    consumed: Decimal,
    /// Live payment amounts plus consumed credit.
    covered: Decimal,
}

impl Coverage {
    fn of<'a>(receipt: &ReceiptState, ledger: impl IntoIterator<Item = &'a LedgerEntry>) -> Self {
        let (paid, drawn) = ledger
            .into_iter()
            .filter(|entry| entry.status.is_live())
            .fold((Decimal::ZERO, Decimal::ZERO), |(paid, drawn), entry| {
                (paid + entry.amount, drawn + entry.credit_applied)
            });
        let consumed = receipt.opening_credit.min(drawn);
        Self {
            consumed,
            covered: paid + consumed,
        }
    }

    fn unused_credit(&self, receipt: &ReceiptState) -> Decimal {
        non_negative(receipt.opening_credit - self.consumed)
    }

    fn reconcile(&self, receipt: &ReceiptState) -> ReconciledReceipt {
        let pending = non_negative(receipt.amount - self.covered);
        let credit = self.unused_credit(receipt) + non_negative(self.covered - receipt.amount);
        ReconciledReceipt::settle(pending, credit, derive_status(pending, receipt.amount))
    }
}

/// The ledger with `target` switched to `status`, appended if it was missing.
fn with_status(ledger: &[LedgerEntry], target: &LedgerEntry, status: PaymentStatus) -> Vec<LedgerEntry> {
    let mut entries = ledger.to_vec();
    match entries.iter_mut().find(|entry| entry.payment_id == target.payment_id) {
        Some(entry) => entry.status = status,
        None => entries.push(LedgerEntry {
            status,
            ..target.clone()
        }),
    }
    entries
}

fn approved_total(ledger: &[LedgerEntry]) -> Decimal {
    ledger
        .iter()
        .filter(|entry| entry.status == PaymentStatus::Approved)
        .map(|entry| entry.amount)
        .sum()
}

impl ReceiptReconciler for LedgerReconciler {
    fn name(&self) -> &'static str {
        "ledger"
    }

    fn apply_payment(
        &self,
        receipt: &ReceiptState,
        ledger: &[LedgerEntry],
        amount: Decimal,
        status: PaymentStatus,
    ) -> Result<PaymentApplication> {
        ensure_creatable(status)?;
        let amount = validate_amount(amount)?;

        let before = Coverage::of(receipt, ledger);
        let credit_applied = if status.is_live() {
            let shortfall = non_negative(receipt.amount - before.covered - amount);
            before.unused_credit(receipt).min(shortfall)
        } else {
            Decimal::ZERO
        };

        let incoming = LedgerEntry {
            payment_id: 0,
            amount,
            status,
            credit_applied,
        };
        let after = Coverage::of(receipt, ledger.iter().chain(std::iter::once(&incoming)));
        let reconciled = after.reconcile(receipt).ensure_storable()?;

        debug!(
            "Ledger apply of {}: covered {} -> {}, credit applied {}",
            amount, before.covered, after.covered, credit_applied
        );

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

        let entries = with_status(ledger, target, new_status);
        let reconciled = Coverage::of(receipt, &entries).reconcile(receipt).ensure_storable()?;
        let total_verified = approved_total(&entries);

        debug!(
            "Ledger status change of payment {} to {}: approved total {}, pending {}",
            target.payment_id, new_status, total_verified, reconciled.pending_amount
        );

        Ok(StatusChange {
            verified_amount: target.amount,
            total_verified: round_money(total_verified),
            credit_applied: target.credit_applied,
            remaining_amount: reconciled.pending_amount,
            receipt: reconciled,
        })
    }

    fn reverse_payment(
        &self,
        receipt: &ReceiptState,
        ledger: &[LedgerEntry],
        target: &LedgerEntry,
    ) -> Result<Reversal> {
        ensure_reversible(target)?;

        let entries = with_status(ledger, target, PaymentStatus::Anuled);
        let reconciled = Coverage::of(receipt, &entries).reconcile(receipt);
        let credit_adjustment = round_money(receipt.credit_balance - reconciled.credit_balance);

        debug!(
            "Ledger reversal of payment {}: pending {}, credit adjustment {}",
            target.payment_id, reconciled.pending_amount, credit_adjustment
        );

        Ok(Reversal {
            receipt: reconciled,
            credit_adjustment,
        })
    }
}
