use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{bom, bom_component},
    errors::ServiceError,
    services::catalog::{BomComponentInput, CreateBomInput},
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct BomComponentRequest {
    pub component_item_id: Uuid,
    pub quantity_per_unit: Decimal,
}

#[derive(Debug, Deserialize, ToSchema, validator::Validate)]
pub struct CreateBomRequest {
    pub product_item_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub components: Vec<BomComponentRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplaceComponentsRequest {
    pub components: Vec<BomComponentRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BomResponse {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub bom: bom::Model,
    #[schema(value_type = Vec<Object>)]
    pub components: Vec<bom_component::Model>,
}

pub fn boms_router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create_bom))
        .route("/:id", get(get_bom))
        .route("/:id/components", put(replace_components))
}

fn to_inputs(components: Vec<BomComponentRequest>) -> Vec<BomComponentInput> {
    components
        .into_iter()
        .map(|c| BomComponentInput {
            component_item_id: c.component_item_id,
            quantity_per_unit: c.quantity_per_unit,
        })
        .collect()
}

#[utoipa::path(
    post,
    path = "/api/v1/boms",
    request_body = CreateBomRequest,
    responses(
        (status = 201, description = "BOM created", body = BomResponse),
        (status = 400, description = "Invalid component list"),
        (status = 404, description = "Referenced item not found")
    )
)]
pub async fn create_bom(
    State(state): State<AppState>,
    Json(payload): Json<CreateBomRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validator::Validate::validate(&payload)?;
    let (created, components) = state
        .services
        .catalog
        .create_bom(CreateBomInput {
            product_item_id: payload.product_item_id,
            name: payload.name,
            components: to_inputs(payload.components),
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(BomResponse {
            bom: created,
            components,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/boms/{id}",
    params(("id" = Uuid, Path, description = "BOM id")),
    responses(
        (status = 200, description = "BOM with components", body = BomResponse),
        (status = 404, description = "BOM not found")
    )
)]
pub async fn get_bom(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let (found, components) = state.services.catalog.get_bom(id).await?;
    Ok(Json(BomResponse {
        bom: found,
        components,
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/boms/{id}/components",
    params(("id" = Uuid, Path, description = "BOM id")),
    request_body = ReplaceComponentsRequest,
    responses(
        (status = 200, description = "Component list replaced"),
        (status = 400, description = "BOM is referenced by an assembly"),
        (status = 404, description = "BOM not found")
    )
)]
pub async fn replace_components(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplaceComponentsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let components = state
        .services
        .catalog
        .update_bom_components(id, to_inputs(payload.components))
        .await?;
    Ok(Json(components))
}
