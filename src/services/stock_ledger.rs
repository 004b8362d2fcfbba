use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait, EntityTrait, QuerySelect};
use tracing::debug;
use uuid::Uuid;

use crate::{
    entities::inventory_item::{self, Entity as InventoryItemEntity},
    errors::{ComponentShortage, ServiceError},
};

/// The single writer path for `inventory_item.stock_current`.
///
/// Every operation runs on the caller's connection, so adjustments made by an
/// engine participate in that engine's transaction and roll back with it.
/// The ledger itself holds no state between calls.
pub struct StockLedger;

impl StockLedger {
    /// Loads an item or fails with `NotFound`.
    pub async fn require_item<C: ConnectionTrait>(
        conn: &C,
        item_id: Uuid,
    ) -> Result<inventory_item::Model, ServiceError> {
        InventoryItemEntity::find_by_id(item_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {} not found", item_id)))
    }

    /// Returns the current quantity on hand for an item.
    pub async fn current_stock<C: ConnectionTrait>(
        conn: &C,
        item_id: Uuid,
    ) -> Result<Decimal, ServiceError> {
        Ok(Self::require_item(conn, item_id).await?.stock_current)
    }

    /// Applies an additive stock change.
    ///
    /// The item row is read `FOR UPDATE` inside the caller's transaction
    /// (SQLite has no row locks and relies on its writer lock instead), and
    /// the resulting value is checked on that locked read rather than merely
    /// pre-validated by the caller: two concurrent consumers of the same item
    /// cannot both pass this check and drive the stock negative.
    pub async fn adjust_stock<C: ConnectionTrait>(
        conn: &C,
        item_id: Uuid,
        delta: Decimal,
    ) -> Result<inventory_item::Model, ServiceError> {
        let item = InventoryItemEntity::find_by_id(item_id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory item {} not found", item_id))
            })?;

        let new_stock = item.stock_current + delta;
        if new_stock < Decimal::ZERO {
            return Err(ServiceError::InsufficientStock {
                shortages: vec![ComponentShortage {
                    component_item_id: item.id,
                    component_name: item.name.clone(),
                    required: -delta,
                    available: item.stock_current,
                    shortage: -new_stock,
                }],
            });
        }

        debug!(
            item_id = %item_id,
            %delta,
            %new_stock,
            "Adjusting stock"
        );

        let mut active: inventory_item::ActiveModel = item.into();
        active.stock_current = Set(new_stock);
        active.updated_at = Set(Utc::now());

        active.update(conn).await.map_err(ServiceError::db_error)
    }
}
