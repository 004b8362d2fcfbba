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
    entities::{delivery, sale, sale_item},
    errors::ServiceError,
    services::catalog::CreateSaleInput,
    AppState,
};

#[derive(Debug, Deserialize, ToSchema, validator::Validate)]
pub struct CreateSaleRequest {
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,
    pub assembly_unit_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDeliveryRequest {
    pub sale_id: Uuid,
    /// Restrict the delivery to these sale items; omit to take every
    /// unassigned item on the sale.
    pub sale_item_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FulfillDeliveryRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleResponse {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub sale: sale::Model,
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<sale_item::Model>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryResponse {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub delivery: delivery::Model,
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<sale_item::Model>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FulfillmentResponse {
    pub delivery_id: Uuid,
    pub already_delivered: bool,
    pub units_delivered: usize,
}

pub fn sales_router() -> Router<AppState> {
    Router::new().route("/", post(create_sale))
}

pub fn deliveries_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_delivery))
        .route("/:id", get(get_delivery))
        .route("/:id/fulfill", post(fulfill_delivery))
}

#[utoipa::path(
    post,
    path = "/api/v1/sales",
    request_body = CreateSaleRequest,
    responses(
        (status = 201, description = "Sale recorded", body = SaleResponse),
        (status = 400, description = "Unit already sold or invalid input"),
        (status = 404, description = "Assembly unit not found")
    )
)]
pub async fn create_sale(
    State(state): State<AppState>,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validator::Validate::validate(&payload)?;
    let (created, items) = state
        .services
        .catalog
        .create_sale(CreateSaleInput {
            customer_name: payload.customer_name,
            assembly_unit_ids: payload.assembly_unit_ids,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SaleResponse {
            sale: created,
            items,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/deliveries",
    request_body = CreateDeliveryRequest,
    responses(
        (status = 201, description = "Delivery created", body = DeliveryResponse),
        (status = 400, description = "No items available for delivery"),
        (status = 404, description = "Sale not found")
    )
)]
pub async fn create_delivery(
    State(state): State<AppState>,
    Json(payload): Json<CreateDeliveryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (created, items) = state
        .services
        .catalog
        .create_delivery(payload.sale_id, payload.sale_item_ids)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DeliveryResponse {
            delivery: created,
            items,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/deliveries/{id}",
    params(("id" = Uuid, Path, description = "Delivery id")),
    responses(
        (status = 200, description = "Delivery with its items", body = DeliveryResponse),
        (status = 404, description = "Delivery not found")
    )
)]
pub async fn get_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let (found, items) = state.services.delivery.get_delivery(id).await?;
    Ok(Json(DeliveryResponse {
        delivery: found,
        items,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/deliveries/{id}/fulfill",
    params(("id" = Uuid, Path, description = "Delivery id")),
    request_body = FulfillDeliveryRequest,
    responses(
        (status = 200, description = "Delivery fulfilled, or already was", body = FulfillmentResponse),
        (status = 400, description = "Delivery has no items"),
        (status = 404, description = "Delivery not found")
    )
)]
pub async fn fulfill_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FulfillDeliveryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state
        .services
        .delivery
        .fulfill_delivery(id, payload.user_id)
        .await?;
    Ok(Json(FulfillmentResponse {
        delivery_id: id,
        already_delivered: outcome.already_delivered,
        units_delivered: outcome.units_delivered,
    }))
}
