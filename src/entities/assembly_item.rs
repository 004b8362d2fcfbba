use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Traceability record: which component instance (serial, source lot,
/// vendor) went into which assembly unit. Created during assembly, deleted
/// during reversal.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assembly_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub assembly_unit_id: Uuid,
    pub component_item_id: Uuid,
    pub serial_number: Option<String>,
    pub source_lot_id: Option<Uuid>,
    pub vendor_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assembly_unit::Entity",
        from = "Column::AssemblyUnitId",
        to = "super::assembly_unit::Column::Id"
    )]
    AssemblyUnit,
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::ComponentItemId",
        to = "super::inventory_item::Column::Id"
    )]
    ComponentItem,
}

impl Related<super::assembly_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssemblyUnit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
