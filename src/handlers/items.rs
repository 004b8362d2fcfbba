use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    services::receiving::ReceiveLotInput,
    services::catalog::CreateItemInput,
    AppState,
};

#[derive(Debug, Deserialize, ToSchema, validator::Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default = "default_unit")]
    pub unit_of_measure: String,
    #[serde(default)]
    pub serial_tracked: bool,
}

fn default_unit() -> String {
    "each".to_string()
}

#[derive(Debug, Deserialize, ToSchema, validator::Validate)]
pub struct ReceiveLotRequest {
    pub inventory_item_id: Uuid,
    pub quantity: Decimal,
    #[validate(length(max = 64))]
    pub po_number: Option<String>,
    #[validate(length(max = 255))]
    pub vendor_name: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
}

pub fn items_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item))
        .route("/:id/lots", get(list_lots))
}

pub fn lots_router() -> Router<AppState> {
    Router::new().route("/", post(receive_lot))
}

#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created"),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validator::Validate::validate(&payload)?;
    let item = state
        .services
        .catalog
        .create_item(CreateItemInput {
            name: payload.name,
            unit_of_measure: payload.unit_of_measure,
            serial_tracked: payload.serial_tracked,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    get,
    path = "/api/v1/items",
    responses((status = 200, description = "Item list returned"))
)]
pub async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let items = state.services.catalog.list_items().await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    responses(
        (status = 200, description = "Item returned"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.catalog.get_item(id).await?;
    Ok(Json(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}/lots",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    responses((status = 200, description = "Received lots, oldest first"))
)]
pub async fn list_lots(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let lots = state.services.receiving.list_lots(id).await?;
    Ok(Json(lots))
}

#[utoipa::path(
    post,
    path = "/api/v1/lots",
    request_body = ReceiveLotRequest,
    responses(
        (status = 201, description = "Lot received into stock"),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn receive_lot(
    State(state): State<AppState>,
    Json(payload): Json<ReceiveLotRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validator::Validate::validate(&payload)?;
    let lot = state
        .services
        .receiving
        .receive_lot(ReceiveLotInput {
            inventory_item_id: payload.inventory_item_id,
            quantity: payload.quantity,
            po_number: payload.po_number,
            vendor_name: payload.vendor_name,
            received_at: payload.received_at,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(lot)))
}
