pub mod assemblies;
pub mod boms;
pub mod items;
pub mod sales;
pub mod traceability;
