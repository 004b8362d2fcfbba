use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A received purchase lot for one inventory item.
///
/// `quantity` is the original received amount and never changes;
/// `remaining_quantity` is drawn down by assembly consumption and replenished
/// by assembly reversal, always within `0 ..= quantity`. `received_at` is the
/// FIFO ordering key.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_lots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: rust_decimal::Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub remaining_quantity: rust_decimal::Decimal,
    pub received: bool,
    pub received_at: Option<DateTime<Utc>>,
    pub po_number: Option<String>,
    pub vendor_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::InventoryItemId",
        to = "super::inventory_item::Column::Id"
    )]
    InventoryItem,
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Quantity already consumed from this lot.
    pub fn consumed_quantity(&self) -> rust_decimal::Decimal {
        self.quantity - self.remaining_quantity
    }
}
