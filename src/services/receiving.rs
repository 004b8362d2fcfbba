use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        audit_log,
        purchase_lot::{self, Entity as PurchaseLotEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock_ledger::StockLedger,
};

#[derive(Debug, Clone)]
pub struct ReceiveLotInput {
    pub inventory_item_id: Uuid,
    pub quantity: Decimal,
    pub po_number: Option<String>,
    pub vendor_name: Option<String>,
    /// Receipt time used as the FIFO ordering key; defaults to now.
    pub received_at: Option<DateTime<Utc>>,
}

/// Brings purchase lots into stock.
///
/// The lot row and the ledger increment commit together, so lot totals and
/// `stock_current` stay reconciled.
#[derive(Clone)]
pub struct ReceivingService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl ReceivingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(item_id = %input.inventory_item_id, quantity = %input.quantity))]
    pub async fn receive_lot(
        &self,
        input: ReceiveLotInput,
    ) -> Result<purchase_lot::Model, ServiceError> {
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Lot quantity must be positive, got: {}",
                input.quantity
            )));
        }

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        StockLedger::require_item(&txn, input.inventory_item_id).await?;

        let now = Utc::now();
        let received_at = input.received_at.unwrap_or(now);
        let created = purchase_lot::ActiveModel {
            id: Set(Uuid::new_v4()),
            inventory_item_id: Set(input.inventory_item_id),
            quantity: Set(input.quantity),
            remaining_quantity: Set(input.quantity),
            received: Set(true),
            received_at: Set(Some(received_at)),
            po_number: Set(input.po_number),
            vendor_name: Set(input.vendor_name),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        StockLedger::adjust_stock(&txn, input.inventory_item_id, input.quantity).await?;

        audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            actor_id: Set(None),
            action: Set("lot.received".to_string()),
            entity_type: Set("purchase_lot".to_string()),
            entity_id: Set(created.id),
            detail: Set(Some(json!({
                "inventory_item_id": created.inventory_item_id,
                "quantity": created.quantity,
            }))),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("lots.received", 1);

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::LotReceived {
                    lot_id: created.id,
                    item_id: created.inventory_item_id,
                    quantity: created.quantity,
                })
                .await;
        }

        info!(lot_id = %created.id, "Purchase lot received");
        Ok(created)
    }

    /// Lists an item's received lots oldest-first, the order consumption
    /// will walk them.
    pub async fn list_lots(
        &self,
        item_id: Uuid,
    ) -> Result<Vec<purchase_lot::Model>, ServiceError> {
        PurchaseLotEntity::find()
            .filter(purchase_lot::Column::InventoryItemId.eq(item_id))
            .filter(purchase_lot::Column::Received.eq(true))
            .order_by_asc(purchase_lot::Column::ReceivedAt)
            .order_by_asc(purchase_lot::Column::Id)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }
}
