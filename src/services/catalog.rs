use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        assembly::{self, Entity as AssemblyEntity},
        bom::{self, Entity as BomEntity},
        bom_component::{self, Entity as BomComponentEntity},
        delivery,
        inventory_item::{self, Entity as InventoryItemEntity},
        sale::{self, Entity as SaleEntity},
        sale_item::{self, Entity as SaleItemEntity},
    },
    errors::ServiceError,
    services::stock_ledger::StockLedger,
};

#[derive(Debug, Clone)]
pub struct CreateItemInput {
    pub name: String,
    pub unit_of_measure: String,
    pub serial_tracked: bool,
}

#[derive(Debug, Clone)]
pub struct BomComponentInput {
    pub component_item_id: Uuid,
    pub quantity_per_unit: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateBomInput {
    pub product_item_id: Uuid,
    pub name: String,
    pub components: Vec<BomComponentInput>,
}

#[derive(Debug, Clone)]
pub struct CreateSaleInput {
    pub customer_name: String,
    pub assembly_unit_ids: Vec<Uuid>,
}

/// Master-data operations: items, BOMs, sales and deliveries.
///
/// These set up the rows the engines operate on. The one piece of engine-like
/// logic here is BOM immutability: once any assembly references a BOM, its
/// component list is frozen.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_item(
        &self,
        input: CreateItemInput,
    ) -> Result<inventory_item::Model, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Item name cannot be empty".to_string(),
            ));
        }

        // Items start empty. Stock only enters through received lots, so the
        // ledger and the lot remainders reconcile from the first row on.
        let now = Utc::now();
        let created = inventory_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            unit_of_measure: Set(input.unit_of_measure),
            stock_current: Set(Decimal::ZERO),
            serial_tracked: Set(input.serial_tracked),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(item_id = %created.id, "Inventory item created");
        Ok(created)
    }

    pub async fn get_item(&self, item_id: Uuid) -> Result<inventory_item::Model, ServiceError> {
        StockLedger::require_item(&*self.db, item_id).await
    }

    pub async fn list_items(&self) -> Result<Vec<inventory_item::Model>, ServiceError> {
        InventoryItemEntity::find()
            .order_by_asc(inventory_item::Column::Name)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, input), fields(product_item_id = %input.product_item_id))]
    pub async fn create_bom(
        &self,
        input: CreateBomInput,
    ) -> Result<(bom::Model, Vec<bom_component::Model>), ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "BOM name cannot be empty".to_string(),
            ));
        }
        validate_components(input.product_item_id, &input.components)?;

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        StockLedger::require_item(&txn, input.product_item_id).await?;
        for component in &input.components {
            StockLedger::require_item(&txn, component.component_item_id).await?;
        }

        let now = Utc::now();
        let created = bom::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_item_id: Set(input.product_item_id),
            name: Set(input.name),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut components = Vec::with_capacity(input.components.len());
        for (position, component) in input.components.iter().enumerate() {
            components.push(
                bom_component::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    bom_id: Set(created.id),
                    component_item_id: Set(component.component_item_id),
                    quantity_per_unit: Set(component.quantity_per_unit),
                    position: Set(position as i32),
                    created_at: Set(now),
                }
                .insert(&txn)
                .await
                .map_err(ServiceError::db_error)?,
            );
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(bom_id = %created.id, components = components.len(), "BOM created");
        Ok((created, components))
    }

    pub async fn get_bom(
        &self,
        bom_id: Uuid,
    ) -> Result<(bom::Model, Vec<bom_component::Model>), ServiceError> {
        let found = BomEntity::find_by_id(bom_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("BOM {} not found", bom_id)))?;

        let components = BomComponentEntity::find()
            .filter(bom_component::Column::BomId.eq(found.id))
            .order_by_asc(bom_component::Column::Position)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((found, components))
    }

    /// Replaces a BOM's component list. Rejected once any assembly references
    /// the BOM, so reversals always see the recipe the build used.
    #[instrument(skip(self, components))]
    pub async fn update_bom_components(
        &self,
        bom_id: Uuid,
        components: Vec<BomComponentInput>,
    ) -> Result<Vec<bom_component::Model>, ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let found = BomEntity::find_by_id(bom_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("BOM {} not found", bom_id)))?;

        let referencing = AssemblyEntity::find()
            .filter(assembly::Column::BomId.eq(found.id))
            .count(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if referencing > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "BOM {} is referenced by {} assembly(ies) and cannot be modified",
                found.id, referencing
            )));
        }

        validate_components(found.product_item_id, &components)?;
        for component in &components {
            StockLedger::require_item(&txn, component.component_item_id).await?;
        }

        BomComponentEntity::delete_many()
            .filter(bom_component::Column::BomId.eq(found.id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let now = Utc::now();
        let mut replaced = Vec::with_capacity(components.len());
        for (position, component) in components.iter().enumerate() {
            replaced.push(
                bom_component::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    bom_id: Set(found.id),
                    component_item_id: Set(component.component_item_id),
                    quantity_per_unit: Set(component.quantity_per_unit),
                    position: Set(position as i32),
                    created_at: Set(now),
                }
                .insert(&txn)
                .await
                .map_err(ServiceError::db_error)?,
            );
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(bom_id = %found.id, "BOM components replaced");
        Ok(replaced)
    }

    /// Records a sale of specific built units. A unit can be sold once.
    #[instrument(skip(self, input), fields(customer = %input.customer_name))]
    pub async fn create_sale(
        &self,
        input: CreateSaleInput,
    ) -> Result<(sale::Model, Vec<sale_item::Model>), ServiceError> {
        if input.customer_name.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Customer name cannot be empty".to_string(),
            ));
        }
        if input.assembly_unit_ids.is_empty() {
            return Err(ServiceError::InvalidInput(
                "A sale must reference at least one assembly unit".to_string(),
            ));
        }
        let distinct: HashSet<Uuid> = input.assembly_unit_ids.iter().copied().collect();
        if distinct.len() != input.assembly_unit_ids.len() {
            return Err(ServiceError::InvalidInput(
                "Duplicate assembly units in sale".to_string(),
            ));
        }

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        for unit_id in &input.assembly_unit_ids {
            crate::entities::assembly_unit::Entity::find_by_id(*unit_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Assembly unit {} not found", unit_id))
                })?;

            let already_sold = SaleItemEntity::find()
                .filter(sale_item::Column::AssemblyUnitId.eq(*unit_id))
                .count(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            if already_sold > 0 {
                return Err(ServiceError::InvalidOperation(format!(
                    "Assembly unit {} is already part of a sale",
                    unit_id
                )));
            }
        }

        let now = Utc::now();
        let created = sale::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_name: Set(input.customer_name),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut items = Vec::with_capacity(input.assembly_unit_ids.len());
        for unit_id in &input.assembly_unit_ids {
            items.push(
                sale_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    sale_id: Set(created.id),
                    assembly_unit_id: Set(*unit_id),
                    delivered: Set(false),
                    delivery_id: Set(None),
                    created_at: Set(now),
                }
                .insert(&txn)
                .await
                .map_err(ServiceError::db_error)?,
            );
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(sale_id = %created.id, units = items.len(), "Sale created");
        Ok((created, items))
    }

    /// Creates a delivery grouping a sale's undelivered, unassigned items.
    /// Pass explicit item ids to split a sale across deliveries.
    #[instrument(skip(self))]
    pub async fn create_delivery(
        &self,
        sale_id: Uuid,
        sale_item_ids: Option<Vec<Uuid>>,
    ) -> Result<(delivery::Model, Vec<sale_item::Model>), ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        SaleEntity::find_by_id(sale_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", sale_id)))?;

        let mut query = SaleItemEntity::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .filter(sale_item::Column::Delivered.eq(false))
            .filter(sale_item::Column::DeliveryId.is_null());
        if let Some(ids) = &sale_item_ids {
            query = query.filter(sale_item::Column::Id.is_in(ids.clone()));
        }
        let items = query.all(&txn).await.map_err(ServiceError::db_error)?;

        if items.is_empty() {
            return Err(ServiceError::InvalidOperation(format!(
                "Sale {} has no undelivered items available for a new delivery",
                sale_id
            )));
        }
        if let Some(ids) = &sale_item_ids {
            if items.len() != ids.len() {
                return Err(ServiceError::InvalidOperation(
                    "One or more sale items are delivered, assigned, or not part of this sale"
                        .to_string(),
                ));
            }
        }

        let now = Utc::now();
        let created = delivery::ActiveModel {
            id: Set(Uuid::new_v4()),
            sale_id: Set(sale_id),
            delivered: Set(false),
            delivered_at: Set(None),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut assigned = Vec::with_capacity(items.len());
        for item in items {
            let mut active: sale_item::ActiveModel = item.into();
            active.delivery_id = Set(Some(created.id));
            assigned.push(active.update(&txn).await.map_err(ServiceError::db_error)?);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(delivery_id = %created.id, items = assigned.len(), "Delivery created");
        Ok((created, assigned))
    }
}

fn validate_components(
    product_item_id: Uuid,
    components: &[BomComponentInput],
) -> Result<(), ServiceError> {
    if components.is_empty() {
        return Err(ServiceError::InvalidOperation(
            "BOM has no components".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for component in components {
        if component.quantity_per_unit <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Component quantity must be positive, got: {}",
                component.quantity_per_unit
            )));
        }
        if component.component_item_id == product_item_id {
            return Err(ServiceError::InvalidInput(
                "A BOM cannot list its own product as a component".to_string(),
            ));
        }
        if !seen.insert(component.component_item_id) {
            return Err(ServiceError::InvalidInput(format!(
                "Component {} listed more than once",
                component.component_item_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_empty_component_list() {
        assert!(matches!(
            validate_components(Uuid::new_v4(), &[]),
            Err(ServiceError::InvalidOperation(_))
        ));
    }

    #[test]
    fn rejects_self_referential_and_duplicate_components() {
        let product = Uuid::new_v4();
        assert!(matches!(
            validate_components(
                product,
                &[BomComponentInput {
                    component_item_id: product,
                    quantity_per_unit: dec!(1),
                }]
            ),
            Err(ServiceError::InvalidInput(_))
        ));

        let component = Uuid::new_v4();
        let duplicated = vec![
            BomComponentInput {
                component_item_id: component,
                quantity_per_unit: dec!(1),
            },
            BomComponentInput {
                component_item_id: component,
                quantity_per_unit: dec!(2),
            },
        ];
        assert!(matches!(
            validate_components(Uuid::new_v4(), &duplicated),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_nonpositive_component_quantity() {
        assert!(matches!(
            validate_components(
                Uuid::new_v4(),
                &[BomComponentInput {
                    component_item_id: Uuid::new_v4(),
                    quantity_per_unit: dec!(0),
                }]
            ),
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
