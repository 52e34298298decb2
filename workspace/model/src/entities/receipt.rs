use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{condominium, payment, property};

/// Lifecycle state of a receipt, derived from its outstanding balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
pub enum ReceiptStatus {
    #[sea_orm(string_value = "pending")]
    Pending, // Nothing (or everything again, after a reversal) is owed.
    #[sea_orm(string_value = "partial")]
    Partial, // Some but not all of the amount has been covered.
    #[sea_orm(string_value = "paid")]
    Paid, // The outstanding balance is zero.
    #[sea_orm(string_value = "anuled")]
    Anuled, // Legacy soft-deleted association. Never produced by reconciliation.
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Pending => "pending",
            ReceiptStatus::Partial => "partial",
            ReceiptStatus::Paid => "paid",
            ReceiptStatus::Anuled => "anuled",
        }
    }
}

impl std::fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One billing period's charge to one property.
///
/// Receipts are never physically deleted. `pending_amount`, `credit_balance`
/// and `status` are derived fields and must only be written by the payment
/// reconciliation procedure.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub condominium_id: i32,
    pub property_id: i32,
    /// Billing period label, e.g. "2024-03".
    pub period: String,
    /// The original total owed.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub amount: Decimal,
    /// Currently outstanding balance. `None` means the receipt was never
    /// reconciled and the whole `amount` is outstanding.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub pending_amount: Option<Decimal>,
    /// Overpayment carried forward.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub credit_balance: Decimal,
    /// Credit carried in when the receipt was issued.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub opening_credit: Decimal,
    pub status: ReceiptStatus,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Outstanding balance, reading an uninitialized receipt as fully owed.
    pub fn outstanding(&self) -> Decimal {
        self.pending_amount.unwrap_or(self.amount)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "condominium::Entity",
        from = "Column::CondominiumId",
        to = "condominium::Column::Id",
        on_delete = "Cascade"
    )]
    Condominium,
    #[sea_orm(
        belongs_to = "property::Entity",
        from = "Column::PropertyId",
        to = "property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,
    /// A receipt is settled by any number of payments.
    #[sea_orm(has_many = "payment::Entity")]
    Payment,
}

impl Related<condominium::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Condominium.def()
    }
}

impl Related<property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl Related<payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
