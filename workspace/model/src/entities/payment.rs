use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use std::str::FromStr;

use super::receipt;

mod details;

pub use details::PaymentDetails;

/// Approval state of a single remittance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "verified")]
    Verified,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Soft-deleted. The row is kept and its effect on the receipt reversed.
    #[sea_orm(string_value = "anuled")]
    Anuled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Verified => "verified",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Anuled => "anuled",
        }
    }

    /// Whether money behind this payment is still considered received.
    pub fn is_live(&self) -> bool {
        !matches!(self, PaymentStatus::Rejected | PaymentStatus::Anuled)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "verified" => Ok(PaymentStatus::Verified),
            "approved" => Ok(PaymentStatus::Approved),
            "rejected" => Ok(PaymentStatus::Rejected),
            "anuled" => Ok(PaymentStatus::Anuled),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// One remittance applied against a receipt.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub receipt_id: i32,
    pub condominium_id: i32,
    /// The remitted amount.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub amount: Decimal,
    /// Free-form payment method, e.g. "transfer", "cash".
    pub method: String,
    pub status: PaymentStatus,
    /// Reconciliation bookkeeping plus whatever the caller attached.
    /// Advisory only; see [`PaymentDetails`].
    pub payment_details: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Typed view over `payment_details`. Malformed bags read as empty.
    pub fn details(&self) -> PaymentDetails {
        PaymentDetails::from_json(&self.payment_details).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "receipt::Entity",
        from = "Column::ReceiptId",
        to = "receipt::Column::Id",
        on_delete = "Cascade"
    )]
    Receipt,
}

impl Related<receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
