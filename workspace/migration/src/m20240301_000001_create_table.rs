use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .to_owned(),
            )
            .await?;

        // Create condominiums table
        manager
            .create_table(
                Table::create()
                    .table(Condominiums::Table)
                    .if_not_exists()
                    .col(pk_auto(Condominiums::Id))
                    .col(string(Condominiums::Name))
                    .col(string_null(Condominiums::Address))
                    .to_owned(),
            )
            .await?;

        // Create properties table
        manager
            .create_table(
                Table::create()
                    .table(Properties::Table)
                    .if_not_exists()
                    .col(pk_auto(Properties::Id))
                    .col(integer(Properties::CondominiumId))
                    .col(integer(Properties::OwnerId))
                    .col(string(Properties::Unit))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_properties_condominium")
                            .from(Properties::Table, Properties::CondominiumId)
                            .to(Condominiums::Table, Condominiums::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_properties_owner")
                            .from(Properties::Table, Properties::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create receipts table
        manager
            .create_table(
                Table::create()
                    .table(Receipts::Table)
                    .if_not_exists()
                    .col(pk_auto(Receipts::Id))
                    .col(integer(Receipts::CondominiumId))
                    .col(integer(Receipts::PropertyId))
                    .col(string(Receipts::Period))
                    .col(decimal(Receipts::Amount).decimal_len(16, 2))
                    .col(decimal_null(Receipts::PendingAmount).decimal_len(16, 2))
                    .col(decimal(Receipts::CreditBalance).decimal_len(16, 2).default(0))
                    .col(decimal(Receipts::OpeningCredit).decimal_len(16, 2).default(0))
                    .col(string_len(Receipts::Status, 15).default("pending"))
                    .col(timestamp_with_time_zone(Receipts::CreatedAt))
                    .col(timestamp_with_time_zone(Receipts::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receipts_condominium")
                            .from(Receipts::Table, Receipts::CondominiumId)
                            .to(Condominiums::Table, Condominiums::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receipts_property")
                            .from(Receipts::Table, Receipts::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create payments table
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_auto(Payments::Id))
                    .col(integer(Payments::ReceiptId))
                    .col(integer(Payments::CondominiumId))
                    .col(decimal(Payments::Amount).decimal_len(16, 2))
                    .col(string(Payments::Method))
                    .col(string_len(Payments::Status, 15).default("pending"))
                    .col(json(Payments::PaymentDetails))
                    .col(timestamp_with_time_zone(Payments::CreatedAt))
                    .col(timestamp_with_time_zone(Payments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_receipt")
                            .from(Payments::Table, Payments::ReceiptId)
                            .to(Receipts::Table, Receipts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_condominium")
                            .from(Payments::Table, Payments::CondominiumId)
                            .to(Condominiums::Table, Condominiums::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Reconciliation reads the whole ledger of a receipt on every call
        manager
            .create_index(
                Index::create()
                    .name("idx_payments_receipt_id")
                    .table(Payments::Table)
                    .col(Payments::ReceiptId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_payments_receipt_id").table(Payments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Receipts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Properties::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Condominiums::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

// Define identifiers for all tables

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
}

#[derive(DeriveIden)]
enum Condominiums {
    Table,
    Id,
    Name,
    Address,
}

#[derive(DeriveIden)]
enum Properties {
    Table,
    Id,
    CondominiumId,
    OwnerId,
    Unit,
}

#[derive(DeriveIden)]
enum Receipts {
    Table,
    Id,
    CondominiumId,
    PropertyId,
    Period,
    Amount,
    PendingAmount,
    CreditBalance,
    OpeningCredit,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    ReceiptId,
    CondominiumId,
    Amount,
    Method,
    Status,
    PaymentDetails,
    CreatedAt,
    UpdatedAt,
}
