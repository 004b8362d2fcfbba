use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An inventory item (component or finished good).
///
/// `stock_current` is the authoritative quantity on hand and is mutated only
/// through the stock ledger service, never directly by handlers.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub unit_of_measure: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub stock_current: rust_decimal::Decimal,
    pub serial_tracked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase_lot::Entity")]
    PurchaseLots,
}

impl Related<super::purchase_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseLots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
