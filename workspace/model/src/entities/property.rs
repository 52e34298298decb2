use sea_orm::entity::prelude::*;

use super::{condominium, user};

/// A unit inside a condominium (apartment, parking slot, storage room).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub condominium_id: i32,
    /// The user who owns the unit and is billed for it.
    pub owner_id: i32,
    /// Human readable unit identifier, e.g. "A-101".
    pub unit: String,
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
        belongs_to = "user::Entity",
        from = "Column::OwnerId",
        to = "user::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::receipt::Entity")]
    Receipt,
}

impl Related<condominium::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Condominium.def()
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
