//! Delivery order state machine: availability at creation, consumption at
//! delivery, forward-only transitions, recomputed totals.

mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use supplyflow::{
    entities::delivery_order::DeliveryOrderStatus,
    errors::ServiceError,
    services::delivery_orders::{CreateDeliveryOrderInput, DeliveryOrderLineInput},
};

fn order_input(
    order_number: &str,
    customer_id: i64,
    lines: Vec<DeliveryOrderLineInput>,
) -> CreateDeliveryOrderInput {
    CreateDeliveryOrderInput {
        order_number: order_number.to_string(),
        customer_id,
        expected_delivery_date: None,
        lines,
    }
}

fn line(product_id: i64, quantity: i64, unit_price: rust_decimal::Decimal) -> DeliveryOrderLineInput {
    DeliveryOrderLineInput {
        product_id,
        quantity,
        unit_price,
    }
}

#[tokio::test]
async fn create_rejects_insufficient_stock_and_leaves_stock_unchanged() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("ACME").await;
    let product = app.seed_product("WIDGET", 100, 10).await;

    let err = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-1",
            customer.id,
            vec![line(product.id, 150, dec!(9.99))],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    assert_eq!(app.state.products.get(product.id).await.unwrap().stock, 100);
    // The rejected order left nothing behind.
    let (orders, _) = app.state.delivery_orders.list(0, 10).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn create_checks_availability_without_reserving() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("ACME").await;
    let product = app.seed_product("WIDGET", 100, 10).await;

    let order = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-1",
            customer.id,
            vec![line(product.id, 80, dec!(9.99))],
        ))
        .await
        .unwrap();
    assert_eq!(order.status, DeliveryOrderStatus::Preparing);
    assert_eq!(app.state.products.get(product.id).await.unwrap().stock, 100);

    // Nothing was reserved, so a second order against the same units passes
    // the creation check too.
    app.state
        .delivery_orders
        .create(order_input(
            "DO-2",
            customer.id,
            vec![line(product.id, 80, dec!(9.99))],
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn create_validates_references_and_duplicates() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("ACME").await;
    let product = app.seed_product("WIDGET", 100, 10).await;

    app.state
        .delivery_orders
        .create(order_input(
            "DO-1",
            customer.id,
            vec![line(product.id, 10, dec!(9.99))],
        ))
        .await
        .unwrap();

    let err = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-1",
            customer.id,
            vec![line(product.id, 1, dec!(9.99))],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateResource(_)));

    let err = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-2",
            9999,
            vec![line(product.id, 1, dec!(9.99))],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = app
        .state
        .delivery_orders
        .create(order_input("DO-4", customer.id, vec![]))
        .await
        .unwrap_err();
    match err {
        ServiceError::ValidationError(msg) => assert!(msg.contains("at least one line")),
        other => panic!("unexpected error: {:?}", other),
    }

    let err = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-3",
            customer.id,
            vec![line(9999, 1, dec!(1))],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn delivering_consumes_stock_and_stamps_date() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("ACME").await;
    let product = app.seed_product("WIDGET", 100, 10).await;

    let order = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-1",
            customer.id,
            vec![line(product.id, 30, dec!(9.99))],
        ))
        .await
        .unwrap();

    app.state
        .delivery_orders
        .update_status(order.id, DeliveryOrderStatus::EnRoute)
        .await
        .unwrap();
    assert_eq!(app.state.products.get(product.id).await.unwrap().stock, 100);

    let delivered = app
        .state
        .delivery_orders
        .update_status(order.id, DeliveryOrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(delivered.status, DeliveryOrderStatus::Delivered);
    assert!(delivered.actual_delivery_date.is_some());
    assert_eq!(app.state.products.get(product.id).await.unwrap().stock, 70);
}

#[tokio::test]
async fn delivery_fails_atomically_when_stock_ran_out() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("ACME").await;
    let widget = app.seed_product("WIDGET", 100, 10).await;
    let gadget = app.seed_product("GADGET", 5, 0).await;

    let order = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-1",
            customer.id,
            vec![line(widget.id, 30, dec!(9.99)), line(gadget.id, 5, dec!(4.50))],
        ))
        .await
        .unwrap();

    // Another order drains the gadgets first.
    let rival = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-2",
            customer.id,
            vec![line(gadget.id, 3, dec!(4.50))],
        ))
        .await
        .unwrap();
    app.state
        .delivery_orders
        .update_status(rival.id, DeliveryOrderStatus::EnRoute)
        .await
        .unwrap();
    app.state
        .delivery_orders
        .update_status(rival.id, DeliveryOrderStatus::Delivered)
        .await
        .unwrap();

    app.state
        .delivery_orders
        .update_status(order.id, DeliveryOrderStatus::EnRoute)
        .await
        .unwrap();
    let err = app
        .state
        .delivery_orders
        .update_status(order.id, DeliveryOrderStatus::Delivered)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    // The widget decrement rolled back with the failed delivery.
    assert_eq!(app.state.products.get(widget.id).await.unwrap().stock, 100);
    assert_eq!(app.state.products.get(gadget.id).await.unwrap().stock, 2);
    let reloaded = app.state.delivery_orders.get(order.id).await.unwrap();
    assert_eq!(reloaded.status, DeliveryOrderStatus::EnRoute);
}

#[tokio::test]
async fn terminal_orders_reject_further_status_changes() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("ACME").await;
    let product = app.seed_product("WIDGET", 100, 10).await;

    let order = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-1",
            customer.id,
            vec![line(product.id, 10, dec!(9.99))],
        ))
        .await
        .unwrap();
    app.state
        .delivery_orders
        .update_status(order.id, DeliveryOrderStatus::EnRoute)
        .await
        .unwrap();
    app.state
        .delivery_orders
        .update_status(order.id, DeliveryOrderStatus::Delivered)
        .await
        .unwrap();

    let err = app
        .state
        .delivery_orders
        .update_status(order.id, DeliveryOrderStatus::EnRoute)
        .await
        .unwrap_err();
    match err {
        ServiceError::InvalidTransition(msg) => assert!(msg.contains("already delivered")),
        other => panic!("unexpected error: {:?}", other),
    }
    let reloaded = app.state.delivery_orders.get(order.id).await.unwrap();
    assert_eq!(reloaded.status, DeliveryOrderStatus::Delivered);

    // Cancelled orders behave the same way.
    let second = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-2",
            customer.id,
            vec![line(product.id, 10, dec!(9.99))],
        ))
        .await
        .unwrap();
    app.state
        .delivery_orders
        .update_status(second.id, DeliveryOrderStatus::Cancelled)
        .await
        .unwrap();
    let err = app
        .state
        .delivery_orders
        .update_status(second.id, DeliveryOrderStatus::EnRoute)
        .await
        .unwrap_err();
    match err {
        ServiceError::InvalidTransition(msg) => assert!(msg.contains("already cancelled")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn backward_transitions_are_rejected() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("ACME").await;
    let product = app.seed_product("WIDGET", 100, 10).await;

    let order = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-1",
            customer.id,
            vec![line(product.id, 10, dec!(9.99))],
        ))
        .await
        .unwrap();
    app.state
        .delivery_orders
        .update_status(order.id, DeliveryOrderStatus::EnRoute)
        .await
        .unwrap();

    let err = app
        .state
        .delivery_orders
        .update_status(order.id, DeliveryOrderStatus::Preparing)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
}

#[tokio::test]
async fn delivering_straight_from_preparing_is_rejected() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("ACME").await;
    let product = app.seed_product("WIDGET", 100, 10).await;

    let order = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-1",
            customer.id,
            vec![line(product.id, 30, dec!(9.99))],
        ))
        .await
        .unwrap();

    let err = app
        .state
        .delivery_orders
        .update_status(order.id, DeliveryOrderStatus::Delivered)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));

    // The skipped hop consumed nothing.
    assert_eq!(app.state.products.get(product.id).await.unwrap().stock, 100);
    let reloaded = app.state.delivery_orders.get(order.id).await.unwrap();
    assert_eq!(reloaded.status, DeliveryOrderStatus::Preparing);
}

#[tokio::test]
async fn delete_guards() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("ACME").await;
    let product = app.seed_product("WIDGET", 100, 10).await;

    let order = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-1",
            customer.id,
            vec![line(product.id, 10, dec!(9.99))],
        ))
        .await
        .unwrap();
    app.state
        .delivery_orders
        .update_status(order.id, DeliveryOrderStatus::EnRoute)
        .await
        .unwrap();

    let err = app.state.delivery_orders.delete(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::ImmutableState(_)));

    let preparing = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-2",
            customer.id,
            vec![line(product.id, 10, dec!(9.99))],
        ))
        .await
        .unwrap();
    app.state.delivery_orders.delete(preparing.id).await.unwrap();
    let err = app.state.delivery_orders.get(preparing.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn total_amount_is_recomputed_from_lines() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("ACME").await;
    let widget = app.seed_product("WIDGET", 100, 10).await;
    let gadget = app.seed_product("GADGET", 100, 10).await;

    let order = app
        .state
        .delivery_orders
        .create(order_input(
            "DO-1",
            customer.id,
            vec![
                line(widget.id, 3, dec!(9.99)),
                line(gadget.id, 2, dec!(4.50)),
            ],
        ))
        .await
        .unwrap();

    let total = app.state.delivery_orders.total_amount(order.id).await.unwrap();
    assert_eq!(total, dec!(38.97));

    let lines = app.state.delivery_orders.lines(order.id).await.unwrap();
    assert_eq!(lines.len(), 2);

    let by_customer = app
        .state
        .delivery_orders
        .list_by_customer(customer.id)
        .await
        .unwrap();
    assert_eq!(by_customer.len(), 1);
}
