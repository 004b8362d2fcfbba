use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{assembly, assembly_unit},
    errors::ServiceError,
    services::assembly::{ComponentSerialInput, CreateAssemblyInput},
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ComponentSerialRequest {
    pub unit_number: i32,
    pub component_item_id: Uuid,
    pub serial_number: String,
}

#[derive(Debug, Deserialize, ToSchema, validator::Validate)]
pub struct CreateAssemblyRequest {
    pub bom_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub assembly_name: String,
    pub quantity: i32,
    pub user_id: Option<Uuid>,
    #[validate(length(max = 64))]
    pub po_number: Option<String>,
    #[serde(default)]
    pub unit_serials: Vec<String>,
    #[serde(default)]
    pub component_serials: Vec<ComponentSerialRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReverseAssemblyRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssemblyResponse {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub assembly: assembly::Model,
    #[schema(value_type = Vec<Object>)]
    pub units: Vec<assembly_unit::Model>,
}

pub fn assemblies_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_assembly))
        .route("/:id", get(get_assembly))
        .route("/:id/reverse", post(reverse_assembly))
}

#[utoipa::path(
    post,
    path = "/api/v1/assemblies",
    request_body = CreateAssemblyRequest,
    responses(
        (status = 201, description = "Assembly committed"),
        (status = 400, description = "Invalid input or insufficient stock"),
        (status = 404, description = "BOM not found")
    )
)]
pub async fn create_assembly(
    State(state): State<AppState>,
    Json(payload): Json<CreateAssemblyRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validator::Validate::validate(&payload)?;
    let created = state
        .services
        .assembly
        .create_assembly(CreateAssemblyInput {
            bom_id: payload.bom_id,
            assembly_name: payload.assembly_name,
            quantity: payload.quantity,
            user_id: payload.user_id,
            po_number: payload.po_number,
            unit_serials: payload.unit_serials,
            component_serials: payload
                .component_serials
                .into_iter()
                .map(|s| ComponentSerialInput {
                    unit_number: s.unit_number,
                    component_item_id: s.component_item_id,
                    serial_number: s.serial_number,
                })
                .collect(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/assemblies/{id}",
    params(("id" = Uuid, Path, description = "Assembly id")),
    responses(
        (status = 200, description = "Assembly with its units", body = AssemblyResponse),
        (status = 404, description = "Assembly not found")
    )
)]
pub async fn get_assembly(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let (found, units) = state.services.assembly.get_assembly(id).await?;
    Ok(Json(AssemblyResponse {
        assembly: found,
        units,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/assemblies/{id}/reverse",
    params(("id" = Uuid, Path, description = "Assembly id")),
    request_body = ReverseAssemblyRequest,
    responses(
        (status = 204, description = "Assembly reversed"),
        (status = 400, description = "Units already sold or stock already consumed"),
        (status = 404, description = "Assembly not found")
    )
)]
pub async fn reverse_assembly(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReverseAssemblyRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .assembly
        .reverse_assembly(id, payload.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
