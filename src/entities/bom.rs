use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bill of materials header: which item the BOM produces.
///
/// A BOM referenced by an existing assembly is immutable; edits to its
/// component list are rejected at the service layer so past builds keep the
/// recipe they were built with.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "boms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_item_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::ProductItemId",
        to = "super::inventory_item::Column::Id"
    )]
    ProductItem,
    #[sea_orm(has_many = "super::bom_component::Entity")]
    Components,
    #[sea_orm(has_many = "super::assembly::Entity")]
    Assemblies,
}

impl Related<super::bom_component::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Components.def()
    }
}

impl Related<super::assembly::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assemblies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
