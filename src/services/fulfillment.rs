use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        assembly::Entity as AssemblyEntity,
        assembly_unit::Entity as AssemblyUnitEntity,
        audit_log,
        bom::Entity as BomEntity,
        delivery::{self, Entity as DeliveryEntity},
        sale_item::{self, Entity as SaleItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock_ledger::StockLedger,
};

/// Result of a fulfillment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentOutcome {
    /// True when the delivery was already fulfilled and nothing was changed.
    pub already_delivered: bool,
    pub units_delivered: usize,
}

/// Fulfills deliveries: marks the grouped sale items delivered and removes
/// the finished goods from stock, all in one transaction.
///
/// Fulfillment is idempotent. A delivery that is already delivered returns
/// success without touching anything, so a retried request cannot
/// double-decrement stock.
#[derive(Clone)]
pub struct DeliveryService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl DeliveryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn fulfill_delivery(
        &self,
        delivery_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<FulfillmentOutcome, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let target = DeliveryEntity::find_by_id(delivery_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Delivery {} not found", delivery_id))
            })?;

        if target.delivered {
            info!(delivery_id = %target.id, "Delivery already fulfilled, nothing to do");
            return Ok(FulfillmentOutcome {
                already_delivered: true,
                units_delivered: 0,
            });
        }

        let items = SaleItemEntity::find()
            .filter(sale_item::Column::DeliveryId.eq(target.id))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        if items.is_empty() {
            return Err(ServiceError::InvalidOperation(format!(
                "Delivery {} has no sale items to fulfill",
                target.id
            )));
        }

        // Each sold unit takes one finished good out of stock. Resolve the
        // unit to its assembly's product and batch the decrements per item.
        let mut decrements: HashMap<Uuid, Decimal> = HashMap::new();
        for item in &items {
            let unit = AssemblyUnitEntity::find_by_id(item.assembly_unit_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Assembly unit {} not found",
                        item.assembly_unit_id
                    ))
                })?;
            let parent = AssemblyEntity::find_by_id(unit.assembly_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Assembly {} not found", unit.assembly_id))
                })?;
            let parent_bom = BomEntity::find_by_id(parent.bom_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("BOM {} not found", parent.bom_id))
                })?;

            *decrements.entry(parent_bom.product_item_id).or_default() += Decimal::ONE;
        }

        for (product_item_id, quantity) in &decrements {
            StockLedger::adjust_stock(&txn, *product_item_id, -*quantity).await?;
        }

        let now = Utc::now();
        for item in &items {
            let mut active: sale_item::ActiveModel = item.clone().into();
            active.delivered = Set(true);
            active.update(&txn).await.map_err(ServiceError::db_error)?;
        }

        let sale_id = target.sale_id;
        let units_delivered = items.len();
        let mut active: delivery::ActiveModel = target.clone().into();
        active.delivered = Set(true);
        active.delivered_at = Set(Some(now));
        let fulfilled = active.update(&txn).await.map_err(ServiceError::db_error)?;

        audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            actor_id: Set(user_id),
            action: Set("delivery.fulfilled".to_string()),
            entity_type: Set("delivery".to_string()),
            entity_id: Set(fulfilled.id),
            detail: Set(Some(json!({
                "sale_id": sale_id,
                "units_delivered": units_delivered,
            }))),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("deliveries.fulfilled", 1);

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::DeliveryFulfilled {
                    delivery_id: fulfilled.id,
                    sale_id,
                    units_delivered,
                })
                .await;
        }

        info!(
            delivery_id = %fulfilled.id,
            units_delivered,
            "Delivery fulfilled"
        );

        Ok(FulfillmentOutcome {
            already_delivered: false,
            units_delivered,
        })
    }

    /// Fetches a delivery with its sale items.
    #[instrument(skip(self))]
    pub async fn get_delivery(
        &self,
        delivery_id: Uuid,
    ) -> Result<(delivery::Model, Vec<sale_item::Model>), ServiceError> {
        let db = &*self.db;

        let found = DeliveryEntity::find_by_id(delivery_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Delivery {} not found", delivery_id))
            })?;

        let items = SaleItemEntity::find()
            .filter(sale_item::Column::DeliveryId.eq(found.id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((found, items))
    }
}
