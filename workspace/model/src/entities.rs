//! SeaORM entities for the condominium ledger.
//!
//! Receipts and payments carry the financial state; users, condominiums and
//! properties are read-only collaborators that give the foreign keys and the
//! tenant scoping something real to point at.

pub mod condominium;
pub mod payment;
pub mod property;
pub mod receipt;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::condominium::Entity as Condominium;
    pub use super::payment::Entity as Payment;
    pub use super::property::Entity as Property;
    pub use super::receipt::Entity as Receipt;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use rust_decimal_macros::dec;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, Set,
    };
    use serde_json::json;

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let now = Utc::now();

        let owner = user::ActiveModel {
            username: Set("maria.lopez".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let condo = condominium::ActiveModel {
            name: Set("Residencial Las Palmas".to_string()),
            address: Set(Some("Av. Principal 120".to_string())),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let unit = property::ActiveModel {
            condominium_id: Set(condo.id),
            owner_id: Set(owner.id),
            unit: Set("A-101".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let march = receipt::ActiveModel {
            condominium_id: Set(condo.id),
            property_id: Set(unit.id),
            period: Set("2024-03".to_string()),
            amount: Set(dec!(100.00)),
            pending_amount: Set(None),
            credit_balance: Set(dec!(0)),
            opening_credit: Set(dec!(0)),
            status: Set(receipt::ReceiptStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        for (amount, status) in [
            (dec!(40.00), payment::PaymentStatus::Approved),
            (dec!(20.00), payment::PaymentStatus::Anuled),
        ] {
            payment::ActiveModel {
                receipt_id: Set(march.id),
                condominium_id: Set(condo.id),
                amount: Set(amount),
                method: Set("transfer".to_string()),
                status: Set(status),
                payment_details: Set(json!({"credit_applied": "0.00", "bank_reference": "TRX-1"})),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&db)
            .await?;
        }

        // Uninitialized receipts read as fully outstanding
        let stored = Receipt::find_by_id(march.id).one(&db).await?.expect("receipt exists");
        assert_eq!(stored.pending_amount, None);
        assert_eq!(stored.outstanding(), dec!(100));
        assert_eq!(stored.status, receipt::ReceiptStatus::Pending);

        // Receipt 1 - * Payment
        let payments = stored.find_related(Payment).all(&db).await?;
        assert_eq!(payments.len(), 2);
        assert!(payments.iter().all(|p| p.receipt_id == march.id));

        let approved = Payment::find()
            .filter(payment::Column::ReceiptId.eq(march.id))
            .filter(payment::Column::Status.eq(payment::PaymentStatus::Approved))
            .all(&db)
            .await?;
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].amount, dec!(40));

        let details = approved[0].details();
        assert_eq!(details.credit_applied(), dec!(0));
        assert_eq!(details.extra["bank_reference"], "TRX-1");

        // Collaborators resolve through their relations
        let property_of_receipt = stored.find_related(Property).one(&db).await?.expect("property exists");
        assert_eq!(property_of_receipt.unit, "A-101");
        let owner_of_property = property_of_receipt.find_related(User).one(&db).await?.expect("owner exists");
        assert_eq!(owner_of_property.username, "maria.lopez");
        let condo_receipts = condo.find_related(Receipt).all(&db).await?;
        assert_eq!(condo_receipts.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_payment_requires_existing_receipt() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let now = Utc::now();

        let orphan = payment::ActiveModel {
            receipt_id: Set(999),
            condominium_id: Set(1),
            amount: Set(dec!(10)),
            method: Set("cash".to_string()),
            status: Set(payment::PaymentStatus::Pending),
            payment_details: Set(json!({})),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await;

        assert!(orphan.is_err());
        assert!(Payment::find().all(&db).await?.is_empty());
        Ok(())
    }
}
