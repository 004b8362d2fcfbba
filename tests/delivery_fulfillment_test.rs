mod common;

use chrono::Utc;
use common::{minutes_after_base, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ModelTrait, QueryFilter,
};
use uuid::Uuid;

use fabriq_api::{
    entities::{assembly_unit, delivery, sale_item},
    errors::ServiceError,
    services::assembly::CreateAssemblyInput,
    services::catalog::CreateSaleInput,
};

struct SoldBatch {
    product_id: Uuid,
    sale_id: Uuid,
    delivery_id: Uuid,
}

/// Builds two widgets, sells both units, and groups them into one delivery.
async fn sold_batch(app: &TestApp) -> SoldBatch {
    let product = app.item("Widget").await;
    let screw = app.item("M3 screw").await;
    app.lot_at(screw.id, dec!(4), minutes_after_base(0)).await;
    let (bom, _) = app.bom(product.id, &[(screw.id, dec!(2))]).await;

    let created = app
        .services
        .assembly
        .create_assembly(CreateAssemblyInput {
            bom_id: bom.id,
            assembly_name: "Widget batch".to_string(),
            quantity: 2,
            user_id: None,
            po_number: None,
            unit_serials: Vec::new(),
            component_serials: Vec::new(),
        })
        .await
        .unwrap();

    let units = assembly_unit::Entity::find()
        .filter(assembly_unit::Column::AssemblyId.eq(created.id))
        .all(&*app.db)
        .await
        .unwrap();

    let (sale, _) = app
        .services
        .catalog
        .create_sale(CreateSaleInput {
            customer_name: "Globex".to_string(),
            assembly_unit_ids: units.iter().map(|u| u.id).collect(),
        })
        .await
        .unwrap();

    let (created_delivery, _) = app
        .services
        .catalog
        .create_delivery(sale.id, None)
        .await
        .unwrap();

    SoldBatch {
        product_id: product.id,
        sale_id: sale.id,
        delivery_id: created_delivery.id,
    }
}

#[tokio::test]
async fn fulfillment_marks_items_and_decrements_finished_goods() {
    let app = TestApp::new().await;
    let batch = sold_batch(&app).await;

    assert_eq!(app.stock_of(batch.product_id).await, dec!(2));

    let outcome = app
        .services
        .delivery
        .fulfill_delivery(batch.delivery_id, None)
        .await
        .unwrap();

    assert!(!outcome.already_delivered);
    assert_eq!(outcome.units_delivered, 2);
    assert_eq!(app.stock_of(batch.product_id).await, dec!(0));

    let items = sale_item::Entity::find()
        .filter(sale_item::Column::SaleId.eq(batch.sale_id))
        .all(&*app.db)
        .await
        .unwrap();
    assert!(items.iter().all(|i| i.delivered));
    assert!(items
        .iter()
        .all(|i| i.delivery_id == Some(batch.delivery_id)));

    let fulfilled = delivery::Entity::find_by_id(batch.delivery_id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert!(fulfilled.delivered);
    assert!(fulfilled.delivered_at.is_some());
}

#[tokio::test]
async fn sale_items_resolve_their_delivery_through_the_relation() {
    let app = TestApp::new().await;
    let batch = sold_batch(&app).await;

    let items = sale_item::Entity::find()
        .filter(sale_item::Column::SaleId.eq(batch.sale_id))
        .all(&*app.db)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);

    for item in &items {
        let linked = item
            .find_related(delivery::Entity)
            .one(&*app.db)
            .await
            .unwrap()
            .expect("assigned sale item must resolve its delivery");
        assert_eq!(linked.id, batch.delivery_id);
    }
}

#[tokio::test]
async fn refulfilling_a_delivered_delivery_is_a_noop() {
    let app = TestApp::new().await;
    let batch = sold_batch(&app).await;

    app.services
        .delivery
        .fulfill_delivery(batch.delivery_id, None)
        .await
        .unwrap();
    let stock_after_first = app.stock_of(batch.product_id).await;

    let outcome = app
        .services
        .delivery
        .fulfill_delivery(batch.delivery_id, None)
        .await
        .expect("repeat fulfillment must succeed as a no-op");

    assert!(outcome.already_delivered);
    assert_eq!(outcome.units_delivered, 0);
    // Stock untouched by the retry.
    assert_eq!(app.stock_of(batch.product_id).await, stock_after_first);
}

#[tokio::test]
async fn fulfilling_a_delivery_without_items_is_an_error() {
    let app = TestApp::new().await;
    let batch = sold_batch(&app).await;

    // An item-less delivery cannot be created through the service, so build
    // the row directly to exercise the guard.
    let orphan = delivery::ActiveModel {
        id: Set(Uuid::new_v4()),
        sale_id: Set(batch.sale_id),
        delivered: Set(false),
        delivered_at: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(&*app.db)
    .await
    .unwrap();

    let err = app
        .services
        .delivery
        .fulfill_delivery(orphan.id, None)
        .await
        .expect_err("empty delivery must be rejected");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn fulfilling_an_unknown_delivery_is_not_found() {
    let app = TestApp::new().await;

    let err = app
        .services
        .delivery
        .fulfill_delivery(Uuid::new_v4(), None)
        .await
        .expect_err("unknown delivery must fail");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn creating_a_second_delivery_for_a_fully_assigned_sale_fails() {
    let app = TestApp::new().await;
    let batch = sold_batch(&app).await;

    let err = app
        .services
        .catalog
        .create_delivery(batch.sale_id, None)
        .await
        .expect_err("no unassigned items remain");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}
