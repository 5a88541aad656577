//! Supply order state machine: explicit transition table, atomic receive,
//! line maintenance rules.

mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use supplyflow::{
    entities::supply_order::SupplyOrderStatus,
    errors::ServiceError,
    services::supply_orders::{CreateSupplyOrderInput, SupplyOrderLineInput},
};

fn line(raw_material_id: i64, quantity: i64) -> SupplyOrderLineInput {
    SupplyOrderLineInput {
        raw_material_id,
        quantity,
        unit_price: dec!(2.50),
    }
}

fn order_input(
    order_number: &str,
    supplier_id: i64,
    lines: Vec<SupplyOrderLineInput>,
) -> CreateSupplyOrderInput {
    CreateSupplyOrderInput {
        order_number: order_number.to_string(),
        supplier_id,
        expected_delivery_date: None,
        lines,
    }
}

#[tokio::test]
async fn create_requires_at_least_one_line() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("STEELCO").await;

    let err = app
        .state
        .supply_orders
        .create(order_input("SO-1", supplier.id, vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn create_validates_references_and_duplicates() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("STEELCO").await;
    let steel = app.seed_material("STEEL", 0).await;

    app.state
        .supply_orders
        .create(order_input("SO-1", supplier.id, vec![line(steel.id, 100)]))
        .await
        .unwrap();

    let err = app
        .state
        .supply_orders
        .create(order_input("SO-1", supplier.id, vec![line(steel.id, 10)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateResource(_)));

    let err = app
        .state
        .supply_orders
        .create(order_input("SO-2", 9999, vec![line(steel.id, 10)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = app
        .state
        .supply_orders
        .create(order_input("SO-3", supplier.id, vec![line(9999, 10)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn receive_adds_every_line_to_stock_atomically() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("STEELCO").await;
    let steel = app.seed_material("STEEL", 50).await;
    let bolts = app.seed_material("BOLTS", 200).await;

    let order = app
        .state
        .supply_orders
        .create(order_input(
            "SO-1",
            supplier.id,
            vec![line(steel.id, 100), line(bolts.id, 500)],
        ))
        .await
        .unwrap();
    assert_eq!(order.status, SupplyOrderStatus::Pending);

    app.state
        .supply_orders
        .update_status(order.id, SupplyOrderStatus::InProgress)
        .await
        .unwrap();

    let received = app.state.supply_orders.receive(order.id).await.unwrap();
    assert_eq!(received.status, SupplyOrderStatus::Received);
    assert!(received.actual_delivery_date.is_some());

    assert_eq!(app.state.raw_materials.get(steel.id).await.unwrap().stock, 150);
    assert_eq!(app.state.raw_materials.get(bolts.id).await.unwrap().stock, 700);
}

#[tokio::test]
async fn receive_requires_in_progress() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("STEELCO").await;
    let steel = app.seed_material("STEEL", 0).await;

    let order = app
        .state
        .supply_orders
        .create(order_input("SO-1", supplier.id, vec![line(steel.id, 100)]))
        .await
        .unwrap();

    let err = app.state.supply_orders.receive(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
    assert_eq!(app.state.raw_materials.get(steel.id).await.unwrap().stock, 0);
}

#[tokio::test]
async fn transition_table_is_enforced() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("STEELCO").await;
    let steel = app.seed_material("STEEL", 0).await;

    let order = app
        .state
        .supply_orders
        .create(order_input("SO-1", supplier.id, vec![line(steel.id, 100)]))
        .await
        .unwrap();

    // Pending cannot jump straight to Received.
    let err = app
        .state
        .supply_orders
        .update_status(order.id, SupplyOrderStatus::Received)
        .await
        .unwrap_err();
    match err {
        ServiceError::InvalidTransition(msg) => assert!(msg.contains("InProgress")),
        other => panic!("unexpected error: {:?}", other),
    }

    // Cancelled reactivates to Pending only.
    app.state.supply_orders.cancel(order.id).await.unwrap();
    let err = app
        .state
        .supply_orders
        .update_status(order.id, SupplyOrderStatus::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));

    let reactivated = app
        .state
        .supply_orders
        .update_status(order.id, SupplyOrderStatus::Pending)
        .await
        .unwrap();
    assert_eq!(reactivated.status, SupplyOrderStatus::Pending);

    // Received is final, whichever way a change is attempted.
    app.state
        .supply_orders
        .update_status(order.id, SupplyOrderStatus::InProgress)
        .await
        .unwrap();
    app.state.supply_orders.receive(order.id).await.unwrap();

    for target in [
        SupplyOrderStatus::Pending,
        SupplyOrderStatus::InProgress,
        SupplyOrderStatus::Cancelled,
    ] {
        let err = app
            .state
            .supply_orders
            .update_status(order.id, target)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
    }
    let err = app.state.supply_orders.cancel(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
    // Receiving twice cannot double the stock.
    assert_eq!(app.state.raw_materials.get(steel.id).await.unwrap().stock, 100);
}

#[tokio::test]
async fn delete_rejected_once_received() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("STEELCO").await;
    let steel = app.seed_material("STEEL", 0).await;

    let order = app
        .state
        .supply_orders
        .create(order_input("SO-1", supplier.id, vec![line(steel.id, 10)]))
        .await
        .unwrap();
    app.state
        .supply_orders
        .update_status(order.id, SupplyOrderStatus::InProgress)
        .await
        .unwrap();
    app.state.supply_orders.receive(order.id).await.unwrap();

    let err = app.state.supply_orders.delete(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::ImmutableState(_)));

    // A cancelled order can go.
    let other = app
        .state
        .supply_orders
        .create(order_input("SO-2", supplier.id, vec![line(steel.id, 10)]))
        .await
        .unwrap();
    app.state.supply_orders.cancel(other.id).await.unwrap();
    app.state.supply_orders.delete(other.id).await.unwrap();
}

#[tokio::test]
async fn last_line_cannot_be_removed() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("STEELCO").await;
    let steel = app.seed_material("STEEL", 0).await;

    let order = app
        .state
        .supply_orders
        .create(order_input("SO-1", supplier.id, vec![line(steel.id, 10)]))
        .await
        .unwrap();
    let lines = app.state.supply_orders.lines(order.id).await.unwrap();
    assert_eq!(lines.len(), 1);

    let err = app
        .state
        .supply_orders
        .remove_line(lines[0].id)
        .await
        .unwrap_err();
    match err {
        ServiceError::ValidationError(msg) => assert!(msg.contains("last line")),
        other => panic!("unexpected error: {:?}", other),
    }

    let lines = app.state.supply_orders.lines(order.id).await.unwrap();
    assert_eq!(lines.len(), 1);
}

#[tokio::test]
async fn line_mutations_follow_parent_state() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("STEELCO").await;
    let steel = app.seed_material("STEEL", 0).await;
    let bolts = app.seed_material("BOLTS", 0).await;

    let order = app
        .state
        .supply_orders
        .create(order_input("SO-1", supplier.id, vec![line(steel.id, 10)]))
        .await
        .unwrap();

    let added = app
        .state
        .supply_orders
        .add_line(order.id, line(bolts.id, 40))
        .await
        .unwrap();
    app.state
        .supply_orders
        .update_line(added.id, Some(50), Some(dec!(0.10)))
        .await
        .unwrap();

    // With two lines, one may now be removed.
    app.state.supply_orders.remove_line(added.id).await.unwrap();

    app.state
        .supply_orders
        .update_status(order.id, SupplyOrderStatus::InProgress)
        .await
        .unwrap();
    app.state.supply_orders.receive(order.id).await.unwrap();

    // Terminal parent freezes the lines.
    let err = app
        .state
        .supply_orders
        .add_line(order.id, line(bolts.id, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ImmutableState(_)));
    let lines = app.state.supply_orders.lines(order.id).await.unwrap();
    let err = app
        .state
        .supply_orders
        .update_line(lines[0].id, Some(99), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ImmutableState(_)));
}

#[tokio::test]
async fn total_amount_is_recomputed_from_lines() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("STEELCO").await;
    let steel = app.seed_material("STEEL", 0).await;
    let bolts = app.seed_material("BOLTS", 0).await;

    let order = app
        .state
        .supply_orders
        .create(order_input(
            "SO-1",
            supplier.id,
            vec![
                SupplyOrderLineInput {
                    raw_material_id: steel.id,
                    quantity: 10,
                    unit_price: dec!(2.50),
                },
                SupplyOrderLineInput {
                    raw_material_id: bolts.id,
                    quantity: 100,
                    unit_price: dec!(0.10),
                },
            ],
        ))
        .await
        .unwrap();

    let total = app.state.supply_orders.total_amount(order.id).await.unwrap();
    assert_eq!(total, dec!(35.00));

    let by_supplier = app
        .state
        .supply_orders
        .list_by_supplier(supplier.id)
        .await
        .unwrap();
    assert_eq!(by_supplier.len(), 1);
}
