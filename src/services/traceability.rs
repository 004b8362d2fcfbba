use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{
        assembly::Entity as AssemblyEntity,
        assembly_item::{self, Entity as AssemblyItemEntity},
        assembly_unit::{self, Entity as AssemblyUnitEntity},
        bom::Entity as BomEntity,
        inventory_item::{self, Entity as InventoryItemEntity},
        purchase_lot::{self, Entity as PurchaseLotEntity},
        sale_item::{self, Entity as SaleItemEntity},
    },
    errors::ServiceError,
};

/// Provenance of one component instance inside a built unit.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComponentTrace {
    pub component_item_id: Uuid,
    pub component_name: String,
    pub serial_number: Option<String>,
    pub source_lot_id: Option<Uuid>,
    pub po_number: Option<String>,
    pub vendor_name: Option<String>,
}

/// Where a built unit ended up, if it entered a sale.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnitDisposition {
    pub sale_id: Uuid,
    pub delivered: bool,
    pub delivery_id: Option<Uuid>,
}

/// Full trace for a single built unit: what went into it and where it went.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnitTrace {
    pub unit_id: Uuid,
    pub unit_number: i32,
    pub serial_number: Option<String>,
    pub assembly_id: Uuid,
    pub assembly_name: String,
    pub product_item_id: Uuid,
    pub product_name: String,
    pub components: Vec<ComponentTrace>,
    pub disposition: Option<UnitDisposition>,
}

/// Trace for a whole assembly, one entry per built unit.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssemblyTrace {
    pub assembly_id: Uuid,
    pub assembly_name: String,
    pub quantity: i32,
    pub product_item_id: Uuid,
    pub product_name: String,
    pub units: Vec<UnitTrace>,
}

/// Read-only projection over the rows the engines write.
///
/// Answers "what is in this unit and where did it come from" without
/// touching stock or lots, so it never needs a transaction.
#[derive(Clone)]
pub struct TraceabilityService {
    db: Arc<DatabaseConnection>,
}

impl TraceabilityService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn unit_trace(&self, unit_id: Uuid) -> Result<UnitTrace, ServiceError> {
        let db = &*self.db;

        let unit = AssemblyUnitEntity::find_by_id(unit_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Assembly unit {} not found", unit_id))
            })?;

        self.trace_unit(&unit).await
    }

    #[instrument(skip(self))]
    pub async fn assembly_trace(&self, assembly_id: Uuid) -> Result<AssemblyTrace, ServiceError> {
        let db = &*self.db;

        let target = AssemblyEntity::find_by_id(assembly_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Assembly {} not found", assembly_id))
            })?;

        let (product_item_id, product_name) = self.product_of(target.bom_id).await?;

        let unit_rows = AssemblyUnitEntity::find()
            .filter(assembly_unit::Column::AssemblyId.eq(target.id))
            .order_by_asc(assembly_unit::Column::UnitNumber)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut units = Vec::with_capacity(unit_rows.len());
        for unit in &unit_rows {
            units.push(self.trace_unit(unit).await?);
        }

        Ok(AssemblyTrace {
            assembly_id: target.id,
            assembly_name: target.assembly_name,
            quantity: target.quantity,
            product_item_id,
            product_name,
            units,
        })
    }

    async fn trace_unit(&self, unit: &assembly_unit::Model) -> Result<UnitTrace, ServiceError> {
        let db = &*self.db;

        let parent = AssemblyEntity::find_by_id(unit.assembly_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Assembly {} not found", unit.assembly_id))
            })?;

        let (product_item_id, product_name) = self.product_of(parent.bom_id).await?;

        let items = AssemblyItemEntity::find()
            .filter(assembly_item::Column::AssemblyUnitId.eq(unit.id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let item_names = self
            .item_names(items.iter().map(|i| i.component_item_id).collect())
            .await?;
        let lot_po_numbers = self
            .lot_po_numbers(items.iter().filter_map(|i| i.source_lot_id).collect())
            .await?;

        let components = items
            .iter()
            .map(|item| ComponentTrace {
                component_item_id: item.component_item_id,
                component_name: item_names
                    .get(&item.component_item_id)
                    .cloned()
                    .unwrap_or_default(),
                serial_number: item.serial_number.clone(),
                source_lot_id: item.source_lot_id,
                po_number: item
                    .source_lot_id
                    .and_then(|lot_id| lot_po_numbers.get(&lot_id).cloned())
                    .flatten(),
                vendor_name: item.vendor_name.clone(),
            })
            .collect();

        let disposition = SaleItemEntity::find()
            .filter(sale_item::Column::AssemblyUnitId.eq(unit.id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .map(|sold| UnitDisposition {
                sale_id: sold.sale_id,
                delivered: sold.delivered,
                delivery_id: sold.delivery_id,
            });

        Ok(UnitTrace {
            unit_id: unit.id,
            unit_number: unit.unit_number,
            serial_number: unit.serial_number.clone(),
            assembly_id: parent.id,
            assembly_name: parent.assembly_name,
            product_item_id,
            product_name,
            components,
            disposition,
        })
    }

    async fn product_of(&self, bom_id: Uuid) -> Result<(Uuid, String), ServiceError> {
        let db = &*self.db;

        let parent_bom = BomEntity::find_by_id(bom_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("BOM {} not found", bom_id)))?;

        let product = InventoryItemEntity::find_by_id(parent_bom.product_item_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Inventory item {} not found",
                    parent_bom.product_item_id
                ))
            })?;

        Ok((product.id, product.name))
    }

    async fn item_names(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, String>, ServiceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let db = &*self.db;
        let items = InventoryItemEntity::find()
            .filter(inventory_item::Column::Id.is_in(ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(items.into_iter().map(|i| (i.id, i.name)).collect())
    }

    async fn lot_po_numbers(
        &self,
        ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, Option<String>>, ServiceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let db = &*self.db;
        let lots = PurchaseLotEntity::find()
            .filter(purchase_lot::Column::Id.is_in(ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(lots.into_iter().map(|l| (l.id, l.po_number)).collect())
    }
}
