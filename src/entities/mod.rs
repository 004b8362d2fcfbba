//! SeaORM entities for the manufacturing inventory schema.

pub mod assembly;
pub mod assembly_item;
pub mod assembly_unit;
pub mod audit_log;
pub mod bom;
pub mod bom_component;
pub mod delivery;
pub mod inventory_item;
pub mod purchase_lot;
pub mod sale;
pub mod sale_item;
