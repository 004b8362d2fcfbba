//! Manufacturing inventory backend: BOM-driven assembly builds, FIFO lot
//! consumption, exact reversal, delivery fulfillment and traceability.
//!
//! Layering is conventional: handlers deserialize and validate, services own
//! the transactions, entities map the tables. The stock ledger and lot
//! tracker are the only writers of quantities, and every engine operation is
//! a single database transaction.

#![warn(clippy::all)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::{
    AssemblyService, CatalogService, DeliveryService, ReceivingService, TraceabilityService,
};

/// The service layer, one instance per process, shared by all handlers.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub receiving: ReceivingService,
    pub assembly: AssemblyService,
    pub delivery: DeliveryService,
    pub traceability: TraceabilityService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self {
            catalog: CatalogService::new(db.clone()),
            receiving: ReceivingService::new(db.clone(), event_sender.clone()),
            assembly: AssemblyService::new(db.clone(), event_sender.clone()),
            delivery: DeliveryService::new(db.clone(), event_sender),
            traceability: TraceabilityService::new(db),
        }
    }
}

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        let services = AppServices::new(db.clone(), None);
        Self {
            db,
            config,
            services,
        }
    }

    pub fn with_events(
        db: Arc<DatabaseConnection>,
        config: Arc<AppConfig>,
        event_sender: EventSender,
    ) -> Self {
        let services = AppServices::new(db.clone(), Some(event_sender));
        Self {
            db,
            config,
            services,
        }
    }
}

/// The versioned API surface, nested under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/items", handlers::items::items_router())
        .nest("/lots", handlers::items::lots_router())
        .nest("/boms", handlers::boms::boms_router())
        .nest("/assemblies", handlers::assemblies::assemblies_router())
        .nest("/sales", handlers::sales::sales_router())
        .nest("/deliveries", handlers::sales::deliveries_router())
        .nest("/traces", handlers::traceability::traceability_router())
}

/// Builds the full application router, including health and docs endpoints.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Liveness plus a database round-trip.
async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state.db.ping().await.is_ok();
    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "database": if db_ok { "up" } else { "down" },
    }))
}

async fn openapi_json() -> impl IntoResponse {
    Json(openapi::ApiDoc::openapi())
}
