//! Transactional entry points around the reconciliation procedure.
//!
//! Every mutation runs inside one database transaction: the receipt row is
//! locked, the ledger is read fresh, the reconciler decides, and both the
//! receipt and the payment are written before commit. Returning early drops
//! the transaction, which rolls both writes back.

use std::sync::Arc;

use chrono::Utc;
use model::entities::{payment, property, receipt};
use model::{PaymentDetails, PaymentStatus, ReceiptStatus};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{ComputeError, Result};
use crate::money::{ensure_storable, round_money, validate_amount};
use crate::reconciliation::{
    LedgerEntry, ReceiptReconciler, ReceiptState, ReconciledReceipt, ReconciliationStrategy,
};

/// A payment as submitted by a caller.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub receipt_id: i32,
    /// When given, must match the receipt's condominium.
    pub condominium_id: Option<i32>,
    pub amount: Decimal,
    pub method: String,
    pub status: PaymentStatus,
    pub payment_details: Option<Value>,
}

/// A receipt to issue against a property.
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub property_id: i32,
    pub period: String,
    pub amount: Decimal,
    pub opening_credit: Decimal,
}

/// Stored state after a creation or status change.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub payment: payment::Model,
    pub receipt: receipt::Model,
    pub credit_applied: Decimal,
}

/// Stored state after a reversal.
#[derive(Debug, Clone)]
pub struct ReversalOutcome {
    pub payment: payment::Model,
    pub receipt: receipt::Model,
    pub credit_adjustment: Decimal,
}

#[derive(Clone, Debug)]
pub struct PaymentService {
    reconciler: Arc<dyn ReceiptReconciler>,
}

impl PaymentService {
    pub fn new(reconciler: Arc<dyn ReceiptReconciler>) -> Self {
        Self { reconciler }
    }

    pub fn with_strategy(strategy: ReconciliationStrategy) -> Self {
        Self::new(Arc::from(strategy.reconciler()))
    }

    pub fn strategy_name(&self) -> &'static str {
        self.reconciler.name()
    }

    /// Issue a new, never reconciled receipt for a property.
    #[instrument(skip(self, db))]
    pub async fn issue_receipt(&self, db: &DatabaseConnection, new: NewReceipt) -> Result<receipt::Model> {
        trace!("Issuing receipt for property {}", new.property_id);
        let amount = validate_amount(new.amount)?;
        let opening_credit = ensure_storable(round_money(new.opening_credit))?;
        if opening_credit < Decimal::ZERO {
            return Err(ComputeError::InvalidAmount(format!(
                "opening credit must not be negative, got {}",
                opening_credit
            )));
        }

        let unit = property::Entity::find_by_id(new.property_id)
            .one(db)
            .await?
            .ok_or(ComputeError::PropertyNotFound(new.property_id))?;

        let now = Utc::now();
        let issued = receipt::ActiveModel {
            condominium_id: Set(unit.condominium_id),
            property_id: Set(unit.id),
            period: Set(new.period),
            amount: Set(amount),
            pending_amount: Set(None),
            credit_balance: Set(opening_credit),
            opening_credit: Set(opening_credit),
            status: Set(ReceiptStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!("Issued receipt {} for property {}", issued.id, unit.id);
        Ok(issued)
    }

    /// Record a new payment and fold it into its receipt.
    #[instrument(skip(self, db, new), fields(receipt_id = new.receipt_id, amount = %new.amount))]
    pub async fn create_payment(&self, db: &DatabaseConnection, new: NewPayment) -> Result<PaymentOutcome> {
        trace!("Creating payment with status {}", new.status);
        let mut details = match &new.payment_details {
            Some(value) => PaymentDetails::from_json(value)
                .map_err(|e| ComputeError::InvalidDetails(e.to_string()))?,
            None => PaymentDetails::default(),
        };

        let txn = db.begin().await?;
        let current = lock_receipt(&txn, new.receipt_id).await?;
        if let Some(condominium) = new.condominium_id {
            if condominium != current.condominium_id {
                warn!(
                    "Payment for receipt {} submitted under condominium {}",
                    current.id, condominium
                );
                return Err(ComputeError::CondominiumMismatch {
                    receipt: current.id,
                    condominium,
                });
            }
        }

        let ledger = load_ledger(&txn, current.id).await?;
        let application =
            self.reconciler
                .apply_payment(&ReceiptState::from(&current), &ledger, new.amount, new.status)?;
        debug!("Reconciled receipt {}: {:?}", current.id, application.receipt);

        details.original_amount = Some(application.original_amount);
        details.credit_applied = Some(application.credit_applied);
        details.remaining_amount = Some(application.remaining_amount);
        details.new_credit_balance = Some(application.new_credit_balance);

        let updated = store_receipt(&txn, current, &application.receipt).await?;
        let now = Utc::now();
        let created = payment::ActiveModel {
            receipt_id: Set(updated.id),
            condominium_id: Set(updated.condominium_id),
            amount: Set(application.original_amount),
            method: Set(new.method),
            status: Set(new.status),
            payment_details: Set(details.to_json()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(
            "Created payment {} on receipt {} ({})",
            created.id, updated.id, updated.status
        );
        Ok(PaymentOutcome {
            payment: created,
            receipt: updated,
            credit_applied: application.credit_applied,
        })
    }

    /// Move a payment to a new status and recompute its receipt.
    #[instrument(skip(self, db))]
    pub async fn update_payment_status(
        &self,
        db: &DatabaseConnection,
        payment_id: i32,
        status: PaymentStatus,
    ) -> Result<PaymentOutcome> {
        trace!("Changing status of payment {} to {}", payment_id, status);
        let txn = db.begin().await?;
        let existing = find_payment(&txn, payment_id).await?;
        let current = lock_receipt(&txn, existing.receipt_id).await?;
        let ledger = load_ledger(&txn, current.id).await?;
        let target = target_entry(&ledger, &existing);

        let change = self
            .reconciler
            .change_status(&ReceiptState::from(&current), &ledger, &target, status)?;
        debug!("Reconciled receipt {}: {:?}", current.id, change.receipt);

        let mut details = existing.details();
        details.verified_amount = Some(change.verified_amount);
        details.total_verified = Some(change.total_verified);
        details.credit_applied = Some(change.credit_applied);
        details.remaining_amount = Some(change.remaining_amount);

        let updated_receipt = store_receipt(&txn, current, &change.receipt).await?;
        let mut active: payment::ActiveModel = existing.into();
        active.status = Set(status);
        active.payment_details = Set(details.to_json());
        active.updated_at = Set(Utc::now());
        let updated_payment = active.update(&txn).await?;
        txn.commit().await?;

        info!(
            "Payment {} is now {}, receipt {} is {}",
            updated_payment.id, status, updated_receipt.id, updated_receipt.status
        );
        Ok(PaymentOutcome {
            payment: updated_payment,
            receipt: updated_receipt,
            credit_applied: change.credit_applied,
        })
    }

    /// Soft-delete a payment and take its effect off the receipt.
    #[instrument(skip(self, db))]
    pub async fn reverse_payment(&self, db: &DatabaseConnection, payment_id: i32) -> Result<ReversalOutcome> {
        trace!("Reversing payment {}", payment_id);
        let txn = db.begin().await?;
        let existing = find_payment(&txn, payment_id).await?;
        let current = lock_receipt(&txn, existing.receipt_id).await?;
        let ledger = load_ledger(&txn, current.id).await?;
        let target = target_entry(&ledger, &existing);

        let reversal = self
            .reconciler
            .reverse_payment(&ReceiptState::from(&current), &ledger, &target)?;
        debug!("Reconciled receipt {}: {:?}", current.id, reversal.receipt);

        let updated_receipt = store_receipt(&txn, current, &reversal.receipt).await?;
        let mut active: payment::ActiveModel = existing.into();
        active.status = Set(PaymentStatus::Anuled);
        active.updated_at = Set(Utc::now());
        let anuled = active.update(&txn).await?;
        txn.commit().await?;

        info!(
            "Anuled payment {}, receipt {} is {}",
            anuled.id, updated_receipt.id, updated_receipt.status
        );
        Ok(ReversalOutcome {
            payment: anuled,
            receipt: updated_receipt,
            credit_adjustment: reversal.credit_adjustment,
        })
    }

    pub async fn get_payment(&self, db: &DatabaseConnection, payment_id: i32) -> Result<payment::Model> {
        payment::Entity::find_by_id(payment_id)
            .one(db)
            .await?
            .ok_or(ComputeError::PaymentNotFound(payment_id))
    }

    pub async fn get_receipt(&self, db: &DatabaseConnection, receipt_id: i32) -> Result<receipt::Model> {
        receipt::Entity::find_by_id(receipt_id)
            .one(db)
            .await?
            .ok_or(ComputeError::ReceiptNotFound(receipt_id))
    }

    /// Every payment recorded against a receipt, anuled ones included, oldest first.
    pub async fn list_receipt_payments(&self, db: &DatabaseConnection, receipt_id: i32) -> Result<Vec<payment::Model>> {
        self.get_receipt(db, receipt_id).await?;
        Ok(payment::Entity::find()
            .filter(payment::Column::ReceiptId.eq(receipt_id))
            .order_by_asc(payment::Column::Id)
            .all(db)
            .await?)
    }
}

async fn find_payment(txn: &DatabaseTransaction, payment_id: i32) -> Result<payment::Model> {
    payment::Entity::find_by_id(payment_id)
        .one(txn)
        .await?
        .ok_or(ComputeError::PaymentNotFound(payment_id))
}

/// Row lock on the receipt for the rest of the transaction. SQLite serializes
/// writers on its own and ignores the clause.
async fn lock_receipt(txn: &DatabaseTransaction, receipt_id: i32) -> Result<receipt::Model> {
    receipt::Entity::find_by_id(receipt_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(ComputeError::ReceiptNotFound(receipt_id))
}

async fn load_ledger(txn: &DatabaseTransaction, receipt_id: i32) -> Result<Vec<LedgerEntry>> {
    let payments = payment::Entity::find()
        .filter(payment::Column::ReceiptId.eq(receipt_id))
        .order_by_asc(payment::Column::Id)
        .all(txn)
        .await?;
    Ok(payments.iter().map(LedgerEntry::from).collect())
}

fn target_entry(ledger: &[LedgerEntry], payment: &payment::Model) -> LedgerEntry {
    ledger
        .iter()
        .find(|entry| entry.payment_id == payment.id)
        .cloned()
        .unwrap_or_else(|| LedgerEntry::from(payment))
}

async fn store_receipt(
    txn: &DatabaseTransaction,
    current: receipt::Model,
    reconciled: &ReconciledReceipt,
) -> Result<receipt::Model> {
    let mut active: receipt::ActiveModel = current.into();
    active.pending_amount = Set(Some(reconciled.pending_amount));
    active.credit_balance = Set(reconciled.credit_balance);
    active.status = Set(reconciled.status);
    active.updated_at = Set(Utc::now());
    Ok(active.update(txn).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed, setup_db, Fixture};
    use rust_decimal_macros::dec;
    use serde_json::json;

    async fn setup(strategy: ReconciliationStrategy) -> (DatabaseConnection, Fixture, PaymentService) {
        let db = setup_db().await.expect("Failed to set up database");
        let fixture = seed(&db).await.expect("Failed to seed database");
        (db, fixture, PaymentService::with_strategy(strategy))
    }

    async fn issue(service: &PaymentService, db: &DatabaseConnection, fixture: &Fixture, amount: Decimal, opening: Decimal) -> receipt::Model {
        service
            .issue_receipt(
                db,
                NewReceipt {
                    property_id: fixture.property_id,
                    period: "2024-03".to_string(),
                    amount,
                    opening_credit: opening,
                },
            )
            .await
            .expect("Failed to issue receipt")
    }

    fn payment_of(receipt_id: i32, amount: Decimal) -> NewPayment {
        NewPayment {
            receipt_id,
            condominium_id: None,
            amount,
            method: "transfer".to_string(),
            status: PaymentStatus::Pending,
            payment_details: None,
        }
    }

    #[tokio::test]
    async fn test_issued_receipt_is_unreconciled() {
        let (db, fixture, service) = setup(ReconciliationStrategy::Incremental).await;
        let issued = issue(&service, &db, &fixture, dec!(100), dec!(0)).await;

        assert_eq!(issued.pending_amount, None);
        assert_eq!(issued.status, ReceiptStatus::Pending);
        assert_eq!(issued.condominium_id, fixture.condominium_id);
        let unit = property::Entity::find_by_id(issued.property_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unit.owner_id, fixture.owner_id);

        let missing = service
            .issue_receipt(
                &db,
                NewReceipt {
                    property_id: 999,
                    period: "2024-03".to_string(),
                    amount: dec!(10),
                    opening_credit: dec!(0),
                },
            )
            .await;
        assert!(matches!(missing, Err(ComputeError::PropertyNotFound(999))));
    }

    #[tokio::test]
    async fn test_partial_then_overpayment() {
        let (db, fixture, service) = setup(ReconciliationStrategy::Incremental).await;
        let issued = issue(&service, &db, &fixture, dec!(100), dec!(0)).await;

        let first = service.create_payment(&db, payment_of(issued.id, dec!(40))).await.unwrap();
        assert_eq!(first.receipt.pending_amount, Some(dec!(60)));
        assert_eq!(first.receipt.status, ReceiptStatus::Partial);
        assert_eq!(first.payment.status, PaymentStatus::Pending);

        let details = first.payment.details();
        assert_eq!(details.original_amount, Some(dec!(40)));
        assert_eq!(details.remaining_amount, Some(dec!(60)));
        assert_eq!(details.credit_applied(), dec!(0));

        let second = service.create_payment(&db, payment_of(issued.id, dec!(80))).await.unwrap();
        assert_eq!(second.receipt.pending_amount, Some(dec!(0)));
        assert_eq!(second.receipt.credit_balance, dec!(20));
        assert_eq!(second.receipt.status, ReceiptStatus::Paid);
        assert_eq!(second.payment.details().new_credit_balance, Some(dec!(20)));
    }

    #[tokio::test]
    async fn test_caller_details_are_kept() {
        let (db, fixture, service) = setup(ReconciliationStrategy::Incremental).await;
        let issued = issue(&service, &db, &fixture, dec!(100), dec!(0)).await;

        let mut new = payment_of(issued.id, dec!(25));
        new.payment_details = Some(json!({"bank_reference": "TRX-0042"}));
        let outcome = service.create_payment(&db, new).await.unwrap();

        let stored = service.get_payment(&db, outcome.payment.id).await.unwrap();
        assert_eq!(stored.payment_details["bank_reference"], json!("TRX-0042"));
        assert_eq!(stored.details().original_amount, Some(dec!(25)));
    }

    #[tokio::test]
    async fn test_invalid_details_are_rejected() {
        let (db, fixture, service) = setup(ReconciliationStrategy::Incremental).await;
        let issued = issue(&service, &db, &fixture, dec!(100), dec!(0)).await;

        let mut new = payment_of(issued.id, dec!(25));
        new.payment_details = Some(json!(["not", "an", "object"]));
        let result = service.create_payment(&db, new).await;

        assert!(matches!(result, Err(ComputeError::InvalidDetails(_))));
    }

    #[tokio::test]
    async fn test_missing_receipt_writes_nothing() {
        let (db, _fixture, service) = setup(ReconciliationStrategy::Incremental).await;
        let result = service.create_payment(&db, payment_of(42, dec!(10))).await;

        assert!(matches!(result, Err(ComputeError::ReceiptNotFound(42))));
        let count = payment::Entity::find().all(&db).await.unwrap().len();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_condominium_mismatch_rolls_back() {
        let (db, fixture, service) = setup(ReconciliationStrategy::Incremental).await;
        let issued = issue(&service, &db, &fixture, dec!(100), dec!(0)).await;

        let mut new = payment_of(issued.id, dec!(10));
        new.condominium_id = Some(fixture.condominium_id + 1);
        let result = service.create_payment(&db, new).await;
        assert!(matches!(result, Err(ComputeError::CondominiumMismatch { .. })));

        let reread = service.get_receipt(&db, issued.id).await.unwrap();
        assert_eq!(reread.pending_amount, None);
        assert!(service.list_receipt_payments(&db, issued.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let (db, fixture, service) = setup(ReconciliationStrategy::Incremental).await;
        let issued = issue(&service, &db, &fixture, dec!(100), dec!(0)).await;

        let result = service.create_payment(&db, payment_of(issued.id, dec!(0))).await;
        assert!(matches!(result, Err(ComputeError::InvalidAmount(_))));
    }

    #[tokio::test]
    async fn test_oversized_amounts_leave_receipt_untouched() {
        let (db, fixture, service) = setup(ReconciliationStrategy::Incremental).await;
        let issued = issue(&service, &db, &fixture, dec!(100), dec!(0)).await;

        let first = service
            .create_payment(&db, payment_of(issued.id, dec!(99999999999999)))
            .await
            .unwrap();
        assert_eq!(first.receipt.credit_balance, dec!(99999999999899));

        let second = service
            .create_payment(&db, payment_of(issued.id, dec!(99999999999999)))
            .await;
        assert!(matches!(second, Err(ComputeError::InvalidAmount(_))));

        let stored = service.get_receipt(&db, issued.id).await.unwrap();
        assert_eq!(stored.credit_balance, dec!(99999999999899));
        let payments = service.list_receipt_payments(&db, issued.id).await.unwrap();
        assert_eq!(payments.len(), 1);
    }

    #[tokio::test]
    async fn test_approve_recomputes_from_approved_payments() {
        let (db, fixture, service) = setup(ReconciliationStrategy::Incremental).await;
        let issued = issue(&service, &db, &fixture, dec!(100), dec!(0)).await;

        let first = service.create_payment(&db, payment_of(issued.id, dec!(30))).await.unwrap();
        let second = service.create_payment(&db, payment_of(issued.id, dec!(50))).await.unwrap();

        service
            .update_payment_status(&db, first.payment.id, PaymentStatus::Approved)
            .await
            .unwrap();
        let outcome = service
            .update_payment_status(&db, second.payment.id, PaymentStatus::Approved)
            .await
            .unwrap();

        assert_eq!(outcome.receipt.pending_amount, Some(dec!(20)));
        assert_eq!(outcome.receipt.status, ReceiptStatus::Partial);
        assert_eq!(outcome.payment.status, PaymentStatus::Approved);
        let details = outcome.payment.details();
        assert_eq!(details.verified_amount, Some(dec!(50)));
        assert_eq!(details.total_verified, Some(dec!(80)));
        assert_eq!(details.original_amount, Some(dec!(50)));
    }

    #[tokio::test]
    async fn test_reverse_then_reverse_again() {
        let (db, fixture, service) = setup(ReconciliationStrategy::Incremental).await;
        let issued = issue(&service, &db, &fixture, dec!(100), dec!(0)).await;

        let paid = service.create_payment(&db, payment_of(issued.id, dec!(120))).await.unwrap();
        assert_eq!(paid.receipt.credit_balance, dec!(20));

        let reversed = service.reverse_payment(&db, paid.payment.id).await.unwrap();
        assert_eq!(reversed.payment.status, PaymentStatus::Anuled);
        assert_eq!(reversed.credit_adjustment, dec!(20));
        assert_eq!(reversed.receipt.pending_amount, Some(dec!(100)));
        assert_eq!(reversed.receipt.credit_balance, dec!(0));
        assert_eq!(reversed.receipt.status, ReceiptStatus::Pending);

        // The row survives the soft delete.
        let ledger = service.list_receipt_payments(&db, issued.id).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].status, PaymentStatus::Anuled);

        let again = service.reverse_payment(&db, paid.payment.id).await;
        assert!(matches!(again, Err(ComputeError::AlreadyReversed(_))));
        let status_change = service
            .update_payment_status(&db, paid.payment.id, PaymentStatus::Approved)
            .await;
        assert!(matches!(status_change, Err(ComputeError::AlreadyReversed(_))));
    }

    #[tokio::test]
    async fn test_unknown_payment_is_not_found() {
        let (db, _fixture, service) = setup(ReconciliationStrategy::Incremental).await;

        assert!(matches!(
            service.reverse_payment(&db, 7).await,
            Err(ComputeError::PaymentNotFound(7))
        ));
        assert!(matches!(
            service.update_payment_status(&db, 7, PaymentStatus::Approved).await,
            Err(ComputeError::PaymentNotFound(7))
        ));
        assert!(matches!(
            service.list_receipt_payments(&db, 7).await,
            Err(ComputeError::ReceiptNotFound(7))
        ));
    }

    #[tokio::test]
    async fn test_ledger_strategy_reject_and_reverse() {
        let (db, fixture, service) = setup(ReconciliationStrategy::Ledger).await;
        assert_eq!(service.strategy_name(), "ledger");
        let issued = issue(&service, &db, &fixture, dec!(100), dec!(30)).await;

        let first = service.create_payment(&db, payment_of(issued.id, dec!(50))).await.unwrap();
        assert_eq!(first.credit_applied, dec!(30));
        assert_eq!(first.receipt.pending_amount, Some(dec!(20)));
        assert_eq!(first.receipt.credit_balance, dec!(0));

        let second = service.create_payment(&db, payment_of(issued.id, dec!(20))).await.unwrap();
        assert_eq!(second.receipt.status, ReceiptStatus::Paid);

        let rejected = service
            .update_payment_status(&db, second.payment.id, PaymentStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(rejected.receipt.pending_amount, Some(dec!(20)));
        assert_eq!(rejected.receipt.status, ReceiptStatus::Partial);

        let reversed = service.reverse_payment(&db, first.payment.id).await.unwrap();
        assert_eq!(reversed.receipt.pending_amount, Some(dec!(100)));
        assert_eq!(reversed.receipt.credit_balance, dec!(30));
        assert_eq!(reversed.receipt.status, ReceiptStatus::Pending);
        assert_eq!(reversed.credit_adjustment, dec!(-30));
    }
}
