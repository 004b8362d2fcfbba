use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{errors::ServiceError, AppState};

pub fn traceability_router() -> Router<AppState> {
    Router::new()
        .route("/units/:id", get(unit_trace))
        .route("/assemblies/:id", get(assembly_trace))
}

#[utoipa::path(
    get,
    path = "/api/v1/traces/units/{id}",
    params(("id" = Uuid, Path, description = "Assembly unit id")),
    responses(
        (status = 200, description = "Unit provenance and disposition"),
        (status = 404, description = "Unit not found")
    )
)]
pub async fn unit_trace(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let trace = state.services.traceability.unit_trace(id).await?;
    Ok(Json(trace))
}

#[utoipa::path(
    get,
    path = "/api/v1/traces/assemblies/{id}",
    params(("id" = Uuid, Path, description = "Assembly id")),
    responses(
        (status = 200, description = "Per-unit traces for the assembly"),
        (status = 404, description = "Assembly not found")
    )
)]
pub async fn assembly_trace(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let trace = state.services.traceability.assembly_trace(id).await?;
    Ok(Json(trace))
}
