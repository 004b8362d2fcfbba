use utoipa::OpenApi;

use crate::errors::ErrorResponse;
use crate::handlers;
use crate::services::traceability::{AssemblyTrace, ComponentTrace, UnitDisposition, UnitTrace};

/// OpenAPI document for the v1 API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fabriq API",
        description = "Manufacturing inventory: BOMs, assembly builds, FIFO lot tracking, fulfillment and traceability"
    ),
    paths(
        handlers::items::create_item,
        handlers::items::list_items,
        handlers::items::get_item,
        handlers::items::list_lots,
        handlers::items::receive_lot,
        handlers::boms::create_bom,
        handlers::boms::get_bom,
        handlers::boms::replace_components,
        handlers::assemblies::create_assembly,
        handlers::assemblies::get_assembly,
        handlers::assemblies::reverse_assembly,
        handlers::sales::create_sale,
        handlers::sales::create_delivery,
        handlers::sales::get_delivery,
        handlers::sales::fulfill_delivery,
        handlers::traceability::unit_trace,
        handlers::traceability::assembly_trace,
    ),
    components(schemas(
        ErrorResponse,
        UnitTrace,
        AssemblyTrace,
        ComponentTrace,
        UnitDisposition,
        handlers::items::CreateItemRequest,
        handlers::items::ReceiveLotRequest,
        handlers::boms::CreateBomRequest,
        handlers::boms::BomComponentRequest,
        handlers::boms::ReplaceComponentsRequest,
        handlers::boms::BomResponse,
        handlers::assemblies::CreateAssemblyRequest,
        handlers::assemblies::ComponentSerialRequest,
        handlers::assemblies::ReverseAssemblyRequest,
        handlers::assemblies::AssemblyResponse,
        handlers::sales::CreateSaleRequest,
        handlers::sales::CreateDeliveryRequest,
        handlers::sales::FulfillDeliveryRequest,
        handlers::sales::SaleResponse,
        handlers::sales::DeliveryResponse,
        handlers::sales::FulfillmentResponse,
    )),
    tags(
        (name = "items", description = "Inventory items and purchase lots"),
        (name = "boms", description = "Bills of materials"),
        (name = "assemblies", description = "Assembly builds and reversals"),
        (name = "sales", description = "Sales, deliveries and fulfillment"),
        (name = "traceability", description = "Unit and assembly provenance")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_serializes() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        assert!(json.contains("/api/v1/assemblies"));
        assert!(json.contains("/api/v1/deliveries/{id}/fulfill"));
    }
}
