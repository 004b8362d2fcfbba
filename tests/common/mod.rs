#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tempfile::TempDir;
use tokio::sync::mpsc;
use uuid::Uuid;

use fabriq_api::{
    config::AppConfig,
    db,
    entities::{bom, bom_component, inventory_item, purchase_lot},
    events::{Event, EventSender},
    services::catalog::{BomComponentInput, CreateBomInput, CreateItemInput},
    services::receiving::ReceiveLotInput,
    AppServices, AppState,
};

/// Harness backed by a fresh on-disk SQLite database per test.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub state: AppState,
    pub services: AppServices,
    pub events: mpsc::Receiver<Event>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = dir.path().join("fabriq_test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        let mut cfg = AppConfig::new(url, "127.0.0.1".to_string(), 18_080, "test".to_string());
        cfg.db_max_connections = 5;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        let pool = Arc::new(pool);
        let (tx, rx) = mpsc::channel(64);
        let config = Arc::new(cfg);
        let state = AppState::with_events(pool.clone(), config, EventSender::new(tx));
        let services = state.services.clone();

        Self {
            db: pool,
            state,
            services,
            events: rx,
            _dir: dir,
        }
    }

    /// Creates an item with no stock.
    pub async fn item(&self, name: &str) -> inventory_item::Model {
        self.services
            .catalog
            .create_item(CreateItemInput {
                name: name.to_string(),
                unit_of_measure: "each".to_string(),
                serial_tracked: false,
            })
            .await
            .expect("failed to create item")
    }

    /// Receives a lot with an explicit receipt time so tests control FIFO
    /// order deterministically.
    pub async fn lot_at(
        &self,
        item_id: Uuid,
        quantity: Decimal,
        received_at: DateTime<Utc>,
    ) -> purchase_lot::Model {
        self.services
            .receiving
            .receive_lot(ReceiveLotInput {
                inventory_item_id: item_id,
                quantity,
                po_number: Some(format!("PO-{}", quantity)),
                vendor_name: Some("Acme Components".to_string()),
                received_at: Some(received_at),
            })
            .await
            .expect("failed to receive lot")
    }

    pub async fn lot(&self, item_id: Uuid, quantity: Decimal) -> purchase_lot::Model {
        self.lot_at(item_id, quantity, Utc::now()).await
    }

    pub async fn bom(
        &self,
        product_item_id: Uuid,
        components: &[(Uuid, Decimal)],
    ) -> (bom::Model, Vec<bom_component::Model>) {
        self.services
            .catalog
            .create_bom(CreateBomInput {
                product_item_id,
                name: "Test BOM".to_string(),
                components: components
                    .iter()
                    .map(|(id, qty)| BomComponentInput {
                        component_item_id: *id,
                        quantity_per_unit: *qty,
                    })
                    .collect(),
            })
            .await
            .expect("failed to create BOM")
    }

    pub async fn stock_of(&self, item_id: Uuid) -> Decimal {
        self.services
            .catalog
            .get_item(item_id)
            .await
            .expect("item lookup failed")
            .stock_current
    }
}

/// A receipt time `minutes` after a fixed base, for deterministic lot order.
pub fn minutes_after_base(minutes: i64) -> DateTime<Utc> {
    let base = Utc::now() - Duration::hours(1);
    base + Duration::minutes(minutes)
}
