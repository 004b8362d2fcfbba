use chrono::Utc;
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        assembly::{self, Entity as AssemblyEntity},
        assembly_item::{self, Entity as AssemblyItemEntity},
        assembly_unit::{self, Entity as AssemblyUnitEntity},
        audit_log,
        bom::Entity as BomEntity,
        bom_component::{self, Entity as BomComponentEntity},
        sale_item::{self, Entity as SaleItemEntity},
    },
    errors::{ComponentShortage, ServiceError},
    events::{Event, EventSender},
    services::{
        bom_expander::{self, ComponentRequirement},
        lot_tracker::{LotDraw, LotTracker},
        stock_ledger::StockLedger,
    },
};

/// Serial number recorded for one component instance inside one built unit.
#[derive(Debug, Clone)]
pub struct ComponentSerialInput {
    pub unit_number: i32,
    pub component_item_id: Uuid,
    pub serial_number: String,
}

/// Input payload for committing an assembly build.
#[derive(Debug, Clone)]
pub struct CreateAssemblyInput {
    pub bom_id: Uuid,
    pub assembly_name: String,
    pub quantity: i32,
    pub user_id: Option<Uuid>,
    pub po_number: Option<String>,
    /// Per-unit serials for the finished goods; empty, or exactly one per unit.
    pub unit_serials: Vec<String>,
    /// Serials for serialized component instances, tagged with their unit.
    pub component_serials: Vec<ComponentSerialInput>,
}

/// Orchestrates assembly builds and their exact reversal.
///
/// Both operations run as one database transaction: expand the BOM, move
/// stock through the ledger and lot tracker, write the assembly rows and the
/// audit entry, then commit. Nothing is observable until the commit, and a
/// failure at any step rolls the whole build back.
#[derive(Clone)]
pub struct AssemblyService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl AssemblyService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates an assembly: validates stock for every component, consumes
    /// component stock FIFO from purchase lots, increments the finished
    /// good, and writes the assembly, unit and traceability rows.
    ///
    /// Stock validation reports every short component at once; on any
    /// shortfall nothing is mutated.
    #[instrument(skip(self, input), fields(bom_id = %input.bom_id, quantity = input.quantity))]
    pub async fn create_assembly(
        &self,
        input: CreateAssemblyInput,
    ) -> Result<assembly::Model, ServiceError> {
        validate_create_input(&input)?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let bom = BomEntity::find_by_id(input.bom_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("BOM {} not found", input.bom_id)))?;

        let components = BomComponentEntity::find()
            .filter(bom_component::Column::BomId.eq(bom.id))
            .order_by_asc(bom_component::Column::Position)
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let requirements = bom_expander::expand(&components, input.quantity)?;

        // Validation pass: check every component and collect the full
        // shortfall list before rejecting.
        let mut shortages = Vec::new();
        for requirement in &requirements {
            let item = StockLedger::require_item(&txn, requirement.component_item_id).await?;
            if item.stock_current < requirement.required {
                shortages.push(ComponentShortage {
                    component_item_id: item.id,
                    component_name: item.name.clone(),
                    required: requirement.required,
                    available: item.stock_current,
                    shortage: requirement.required - item.stock_current,
                });
            }
        }

        if !shortages.is_empty() {
            drop(txn);
            warn!(
                bom_id = %bom.id,
                shortage_count = shortages.len(),
                "Rejecting assembly: insufficient stock"
            );
            if let Some(sender) = &self.event_sender {
                for shortage in &shortages {
                    sender
                        .send_or_log(Event::ComponentShortageDetected {
                            bom_id: bom.id,
                            component_item_id: shortage.component_item_id,
                            required: shortage.required,
                            available: shortage.available,
                        })
                        .await;
                }
            }
            counter!("assemblies.rejected_insufficient_stock", 1);
            return Err(ServiceError::InsufficientStock { shortages });
        }

        // Commit pass: consume lots FIFO, then decrement the ledger, for
        // every component; both run on the transaction connection.
        let mut draws_by_component: HashMap<Uuid, Vec<LotDraw>> = HashMap::new();
        for requirement in &requirements {
            let draws =
                LotTracker::consume(&txn, requirement.component_item_id, requirement.required)
                    .await?;
            StockLedger::adjust_stock(&txn, requirement.component_item_id, -requirement.required)
                .await?;
            draws_by_component.insert(requirement.component_item_id, draws);
        }

        // Finished good comes into stock in the same transaction.
        StockLedger::adjust_stock(&txn, bom.product_item_id, Decimal::from(input.quantity))
            .await?;

        let now = Utc::now();
        let created = assembly::ActiveModel {
            id: Set(Uuid::new_v4()),
            bom_id: Set(bom.id),
            assembly_name: Set(input.assembly_name.clone()),
            quantity: Set(input.quantity),
            po_number: Set(input.po_number.clone()),
            created_by: Set(input.user_id),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut serials_by_unit: HashMap<i32, Vec<&ComponentSerialInput>> = HashMap::new();
        for serial in &input.component_serials {
            serials_by_unit.entry(serial.unit_number).or_default().push(serial);
        }

        for unit_number in 1..=input.quantity {
            let unit = assembly_unit::ActiveModel {
                id: Set(Uuid::new_v4()),
                assembly_id: Set(created.id),
                unit_number: Set(unit_number),
                serial_number: Set(input
                    .unit_serials
                    .get((unit_number - 1) as usize)
                    .cloned()),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;

            let unit_serials = serials_by_unit.remove(&unit_number).unwrap_or_default();
            for requirement in &requirements {
                let serial = unit_serials
                    .iter()
                    .find(|s| s.component_item_id == requirement.component_item_id)
                    .map(|s| s.serial_number.clone());
                let first_draw = draws_by_component
                    .get(&requirement.component_item_id)
                    .and_then(|draws| draws.first());

                assembly_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    assembly_unit_id: Set(unit.id),
                    component_item_id: Set(requirement.component_item_id),
                    serial_number: Set(serial),
                    source_lot_id: Set(first_draw.map(|d| d.lot_id)),
                    vendor_name: Set(first_draw.and_then(|d| d.vendor_name.clone())),
                    created_at: Set(now),
                }
                .insert(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            }
        }

        audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            actor_id: Set(input.user_id),
            action: Set("assembly.created".to_string()),
            entity_type: Set("assembly".to_string()),
            entity_id: Set(created.id),
            detail: Set(Some(json!({
                "bom_id": bom.id,
                "quantity": input.quantity,
                "consumption": consumption_detail(&requirements, &draws_by_component),
            }))),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("assemblies.created", 1);
        histogram!("assemblies.quantity", input.quantity as f64);

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::AssemblyCreated {
                    assembly_id: created.id,
                    bom_id: bom.id,
                    quantity: input.quantity,
                })
                .await;
        }

        info!(
            assembly_id = %created.id,
            "Assembly '{}' created: {} unit(s) of BOM {}",
            input.assembly_name, input.quantity, bom.id
        );

        Ok(created)
    }

    /// Reverses an assembly: restores component stock and lot remainders
    /// (oldest lots first, capped at each lot's original quantity), removes
    /// the finished goods from stock, and deletes the assembly rows
    /// child-to-parent.
    ///
    /// Fails fast when any built unit is already referenced by a sale; the
    /// finished goods must still be on hand for the reversal to balance.
    #[instrument(skip(self))]
    pub async fn reverse_assembly(
        &self,
        assembly_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let target = AssemblyEntity::find_by_id(assembly_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Assembly {} not found", assembly_id))
            })?;

        let target_bom = BomEntity::find_by_id(target.bom_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("BOM {} not found", target.bom_id)))?;

        let components = BomComponentEntity::find()
            .filter(bom_component::Column::BomId.eq(target_bom.id))
            .order_by_asc(bom_component::Column::Position)
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let units = AssemblyUnitEntity::find()
            .filter(assembly_unit::Column::AssemblyId.eq(target.id))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        let unit_ids: Vec<Uuid> = units.iter().map(|u| u.id).collect();

        // Precondition: a build whose output already entered a sale cannot
        // be unwound from here.
        if !unit_ids.is_empty() {
            let sold = SaleItemEntity::find()
                .filter(sale_item::Column::AssemblyUnitId.is_in(unit_ids.clone()))
                .count(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            if sold > 0 {
                return Err(ServiceError::InvalidOperation(format!(
                    "Assembly {} has {} unit(s) referenced by sales and cannot be reversed",
                    target.id, sold
                )));
            }
        }

        let requirements = bom_expander::expand(&components, target.quantity)?;

        for requirement in &requirements {
            StockLedger::adjust_stock(&txn, requirement.component_item_id, requirement.required)
                .await?;
            LotTracker::restore(&txn, requirement.component_item_id, requirement.required)
                .await?;
        }

        // The ledger rejects this when the finished goods were consumed
        // elsewhere in the meantime.
        StockLedger::adjust_stock(&txn, target_bom.product_item_id, -Decimal::from(target.quantity))
            .await?;

        // Child-to-parent deletion order for referential integrity.
        if !unit_ids.is_empty() {
            AssemblyItemEntity::delete_many()
                .filter(assembly_item::Column::AssemblyUnitId.is_in(unit_ids.clone()))
                .exec(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            AssemblyUnitEntity::delete_many()
                .filter(assembly_unit::Column::AssemblyId.eq(target.id))
                .exec(&txn)
                .await
                .map_err(ServiceError::db_error)?;
        }
        AssemblyEntity::delete_by_id(target.id)
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            actor_id: Set(user_id),
            action: Set("assembly.reversed".to_string()),
            entity_type: Set("assembly".to_string()),
            entity_id: Set(target.id),
            detail: Set(Some(json!({
                "bom_id": target_bom.id,
                "quantity": target.quantity,
                "restored": requirements
                    .iter()
                    .map(|r| json!({
                        "component_item_id": r.component_item_id,
                        "quantity": r.required,
                    }))
                    .collect::<Vec<_>>(),
            }))),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("assemblies.reversed", 1);

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::AssemblyReversed {
                    assembly_id: target.id,
                    bom_id: target_bom.id,
                    quantity: target.quantity,
                })
                .await;
        }

        info!(assembly_id = %target.id, "Assembly reversed");

        Ok(())
    }

    /// Fetches an assembly with its units, newest units last.
    #[instrument(skip(self))]
    pub async fn get_assembly(
        &self,
        assembly_id: Uuid,
    ) -> Result<(assembly::Model, Vec<assembly_unit::Model>), ServiceError> {
        let db = &*self.db;

        let found = AssemblyEntity::find_by_id(assembly_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Assembly {} not found", assembly_id))
            })?;

        let units = AssemblyUnitEntity::find()
            .filter(assembly_unit::Column::AssemblyId.eq(found.id))
            .order_by_asc(assembly_unit::Column::UnitNumber)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((found, units))
    }
}

fn validate_create_input(input: &CreateAssemblyInput) -> Result<(), ServiceError> {
    if input.assembly_name.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "Assembly name cannot be empty".to_string(),
        ));
    }

    if input.quantity <= 0 {
        return Err(ServiceError::InvalidInput(format!(
            "Build quantity must be positive, got: {}",
            input.quantity
        )));
    }

    if !input.unit_serials.is_empty() && input.unit_serials.len() != input.quantity as usize {
        return Err(ServiceError::InvalidInput(format!(
            "Expected {} unit serial(s), got {}",
            input.quantity,
            input.unit_serials.len()
        )));
    }

    for serial in &input.component_serials {
        if serial.unit_number < 1 || serial.unit_number > input.quantity {
            return Err(ServiceError::InvalidInput(format!(
                "Component serial references unit {}, valid range is 1..={}",
                serial.unit_number, input.quantity
            )));
        }
    }

    Ok(())
}

fn consumption_detail(
    requirements: &[ComponentRequirement],
    draws_by_component: &HashMap<Uuid, Vec<LotDraw>>,
) -> Vec<serde_json::Value> {
    requirements
        .iter()
        .map(|r| {
            let lots: Vec<serde_json::Value> = draws_by_component
                .get(&r.component_item_id)
                .map(|draws| {
                    draws
                        .iter()
                        .map(|d| json!({"lot_id": d.lot_id, "quantity": d.quantity}))
                        .collect()
                })
                .unwrap_or_default();
            json!({
                "component_item_id": r.component_item_id,
                "required": r.required,
                "lots": lots,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> CreateAssemblyInput {
        CreateAssemblyInput {
            bom_id: Uuid::new_v4(),
            assembly_name: "Batch1".to_string(),
            quantity: 3,
            user_id: None,
            po_number: None,
            unit_serials: Vec::new(),
            component_serials: Vec::new(),
        }
    }

    #[test]
    fn rejects_blank_name_and_nonpositive_quantity() {
        let mut input = base_input();
        input.assembly_name = "  ".to_string();
        assert!(matches!(
            validate_create_input(&input),
            Err(ServiceError::InvalidInput(_))
        ));

        let mut input = base_input();
        input.quantity = 0;
        assert!(matches!(
            validate_create_input(&input),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_serial_count_mismatch() {
        let mut input = base_input();
        input.unit_serials = vec!["SN-1".to_string()];
        assert!(matches!(
            validate_create_input(&input),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_component_serial_for_out_of_range_unit() {
        let mut input = base_input();
        input.component_serials = vec![ComponentSerialInput {
            unit_number: 4,
            component_item_id: Uuid::new_v4(),
            serial_number: "SN-X".to_string(),
        }];
        assert!(matches!(
            validate_create_input(&input),
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
