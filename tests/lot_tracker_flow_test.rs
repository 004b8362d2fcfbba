mod common;

use common::{minutes_after_base, TestApp};
use rust_decimal_macros::dec;
use uuid::Uuid;

use fabriq_api::services::assembly::CreateAssemblyInput;

fn build_input(bom_id: Uuid, quantity: i32) -> CreateAssemblyInput {
    CreateAssemblyInput {
        bom_id,
        assembly_name: "FIFO batch".to_string(),
        quantity,
        user_id: None,
        po_number: None,
        unit_serials: Vec::new(),
        component_serials: Vec::new(),
    }
}

#[tokio::test]
async fn consumption_drains_lots_oldest_first() {
    let app = TestApp::new().await;

    let product = app.item("Gadget").await;
    let cell = app.item("Battery cell").await;
    let old_lot = app.lot_at(cell.id, dec!(5), minutes_after_base(0)).await;
    let new_lot = app.lot_at(cell.id, dec!(10), minutes_after_base(5)).await;

    let (bom, _) = app.bom(product.id, &[(cell.id, dec!(8))]).await;
    app.services
        .assembly
        .create_assembly(build_input(bom.id, 1))
        .await
        .unwrap();

    let lots = app.services.receiving.list_lots(cell.id).await.unwrap();
    assert_eq!(lots[0].id, old_lot.id);
    assert_eq!(lots[0].remaining_quantity, dec!(0));
    assert_eq!(lots[1].id, new_lot.id);
    assert_eq!(lots[1].remaining_quantity, dec!(7));
    assert_eq!(app.stock_of(cell.id).await, dec!(7));
}

#[tokio::test]
async fn restoration_refills_oldest_first_capped_at_original_quantity() {
    let app = TestApp::new().await;

    let product = app.item("Gadget").await;
    let cell = app.item("Battery cell").await;
    app.lot_at(cell.id, dec!(5), minutes_after_base(0)).await;
    app.lot_at(cell.id, dec!(10), minutes_after_base(5)).await;

    let (bom, _) = app.bom(product.id, &[(cell.id, dec!(8))]).await;
    let created = app
        .services
        .assembly
        .create_assembly(build_input(bom.id, 1))
        .await
        .unwrap();

    app.services
        .assembly
        .reverse_assembly(created.id, None)
        .await
        .unwrap();

    let lots = app.services.receiving.list_lots(cell.id).await.unwrap();
    assert_eq!(lots[0].remaining_quantity, dec!(5));
    assert_eq!(lots[1].remaining_quantity, dec!(10));
    assert_eq!(app.stock_of(cell.id).await, dec!(15));
}

#[tokio::test]
async fn traceability_records_the_first_source_lot() {
    let app = TestApp::new().await;

    let product = app.item("Gadget").await;
    let cell = app.item("Battery cell").await;
    let old_lot = app.lot_at(cell.id, dec!(5), minutes_after_base(0)).await;
    app.lot_at(cell.id, dec!(10), minutes_after_base(5)).await;

    // The build spans both lots; the recorded source is the oldest one.
    let (bom, _) = app.bom(product.id, &[(cell.id, dec!(8))]).await;
    let created = app
        .services
        .assembly
        .create_assembly(build_input(bom.id, 1))
        .await
        .unwrap();

    let trace = app
        .services
        .traceability
        .assembly_trace(created.id)
        .await
        .unwrap();
    assert_eq!(trace.units.len(), 1);
    let component = &trace.units[0].components[0];
    assert_eq!(component.source_lot_id, Some(old_lot.id));
    assert_eq!(component.vendor_name.as_deref(), Some("Acme Components"));
    assert_eq!(component.po_number.as_deref(), Some("PO-5"));
}

#[tokio::test]
async fn interleaved_builds_share_lots_and_restoration_stays_within_caps() {
    let app = TestApp::new().await;

    let product = app.item("Gadget").await;
    let cell = app.item("Battery cell").await;
    app.lot_at(cell.id, dec!(5), minutes_after_base(0)).await;
    app.lot_at(cell.id, dec!(10), minutes_after_base(5)).await;

    let (bom, _) = app.bom(product.id, &[(cell.id, dec!(4))]).await;

    let first = app
        .services
        .assembly
        .create_assembly(build_input(bom.id, 1))
        .await
        .unwrap();
    let _second = app
        .services
        .assembly
        .create_assembly(build_input(bom.id, 1))
        .await
        .unwrap();

    // Lots now hold [0, 7]. Reversing the first build restores 4 starting
    // from the oldest lot: [4, 7].
    app.services
        .assembly
        .reverse_assembly(first.id, None)
        .await
        .unwrap();

    let lots = app.services.receiving.list_lots(cell.id).await.unwrap();
    assert_eq!(lots[0].remaining_quantity, dec!(4));
    assert_eq!(lots[1].remaining_quantity, dec!(7));

    // Invariant: every lot stays within 0..=quantity.
    for lot in &lots {
        assert!(lot.remaining_quantity >= dec!(0));
        assert!(lot.remaining_quantity <= lot.quantity);
    }
    assert_eq!(app.stock_of(cell.id).await, dec!(11));
}
