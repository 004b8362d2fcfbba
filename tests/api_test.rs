mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{minutes_after_base, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use fabriq_api::app_router;

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_and_status_respond() {
    let app = TestApp::new().await;
    let router = app_router(app.state.clone());

    let (status, body) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&router, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn assembly_lifecycle_over_http() {
    let app = TestApp::new().await;
    let router = app_router(app.state.clone());

    let (status, product) = send(
        &router,
        Method::POST,
        "/api/v1/items",
        Some(json!({ "name": "Widget" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, screw) = send(
        &router,
        Method::POST,
        "/api/v1/items",
        Some(json!({ "name": "M3 screw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/v1/lots",
        Some(json!({
            "inventory_item_id": screw["id"],
            "quantity": "10",
            "po_number": "PO-77",
            "vendor_name": "Acme Components",
            "received_at": minutes_after_base(0),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, bom) = send(
        &router,
        Method::POST,
        "/api/v1/boms",
        Some(json!({
            "product_item_id": product["id"],
            "name": "Widget v1",
            "components": [
                { "component_item_id": screw["id"], "quantity_per_unit": "2" }
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, created) = send(
        &router,
        Method::POST,
        "/api/v1/assemblies",
        Some(json!({
            "bom_id": bom["id"],
            "assembly_name": "Batch 1",
            "quantity": 3,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Ledger moved: 10 - 3*2 = 4 screws left, 3 widgets on hand.
    assert_eq!(app.stock_of(screw["id"].as_str().unwrap().parse().unwrap()).await, dec!(4));
    assert_eq!(app.stock_of(product["id"].as_str().unwrap().parse().unwrap()).await, dec!(3));

    let assembly_id = created["id"].as_str().unwrap();
    let (status, fetched) = send(
        &router,
        Method::GET,
        &format!("/api/v1/assemblies/{}", assembly_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["units"].as_array().unwrap().len(), 3);

    let unit_id = fetched["units"][0]["id"].as_str().unwrap();
    let (status, trace) = send(
        &router,
        Method::GET,
        &format!("/api/v1/traces/units/{}", unit_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trace["product_name"], "Widget");
    assert_eq!(trace["components"][0]["component_name"], "M3 screw");
    assert_eq!(trace["components"][0]["po_number"], "PO-77");

    let (status, _) = send(
        &router,
        Method::POST,
        &format!("/api/v1/assemblies/{}/reverse", assembly_id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn shortfall_surfaces_as_bad_request_with_details() {
    let app = TestApp::new().await;
    let router = app_router(app.state.clone());

    let product = app.item("Widget").await;
    let screw = app.item("M3 screw").await;
    app.lot_at(screw.id, dec!(1), minutes_after_base(0)).await;
    let (bom, _) = app.bom(product.id, &[(screw.id, dec!(2))]).await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/assemblies",
        Some(json!({
            "bom_id": bom.id,
            "assembly_name": "Doomed batch",
            "quantity": 1,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["details"].as_array().expect("shortfall details");
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["component_name"], "M3 screw");
}

#[tokio::test]
async fn unknown_resources_return_404() {
    let app = TestApp::new().await;
    let router = app_router(app.state.clone());

    let id = uuid::Uuid::new_v4();
    for uri in [
        format!("/api/v1/items/{}", id),
        format!("/api/v1/boms/{}", id),
        format!("/api/v1/assemblies/{}", id),
        format!("/api/v1/deliveries/{}", id),
        format!("/api/v1/traces/units/{}", id),
    ] {
        let (status, body) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "expected 404 for {}", uri);
        assert_eq!(body["error"], "Not Found");
    }
}
