//! Database fixtures for service tests.

use migration::{Migrator, MigratorTrait};
use model::entities::{condominium, property, user};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, Set};

pub async fn setup_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Ids of the seeded owner, condominium and property.
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub owner_id: i32,
    pub condominium_id: i32,
    pub property_id: i32,
}

/// One owner with one unit in one condominium, plus a second, empty condominium.
pub async fn seed(db: &DatabaseConnection) -> Result<Fixture, DbErr> {
    let owner = user::ActiveModel {
        username: Set("maria".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let condominium = condominium::ActiveModel {
        name: Set("Residencial Los Pinos".to_string()),
        address: Set(Some("Av. Principal 12".to_string())),
        ..Default::default()
    }
    .insert(db)
    .await?;

    condominium::ActiveModel {
        name: Set("Torre Norte".to_string()),
        address: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let unit = property::ActiveModel {
        condominium_id: Set(condominium.id),
        owner_id: Set(owner.id),
        unit: Set("A-101".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(Fixture {
        owner_id: owner.id,
        condominium_id: condominium.id,
        property_id: unit.id,
    })
}
