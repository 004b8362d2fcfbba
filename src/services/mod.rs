pub mod assembly;
pub mod bom_expander;
pub mod catalog;
pub mod fulfillment;
pub mod lot_tracker;
pub mod receiving;
pub mod stock_ledger;
pub mod traceability;

pub use assembly::AssemblyService;
pub use catalog::CatalogService;
pub use fulfillment::DeliveryService;
pub use receiving::ReceivingService;
pub use traceability::TraceabilityService;
