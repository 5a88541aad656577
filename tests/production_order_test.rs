//! Production order state machine: material checks at start, consumption at
//! completion, atomic rollback, terminal immutability.

mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use supplyflow::{
    entities::production_order::ProductionOrderStatus,
    errors::ServiceError,
    services::production_orders::{CreateProductionOrderInput, UpdateProductionOrderInput},
};

fn order_input(order_number: &str, product_id: i64, quantity: i64) -> CreateProductionOrderInput {
    CreateProductionOrderInput {
        order_number: order_number.to_string(),
        product_id,
        quantity,
    }
}

#[tokio::test]
async fn create_skips_material_check_but_validates_references() {
    let app = TestApp::new().await;
    let product = app.seed_product("CHAIR", 0, 0).await;
    let wood = app.seed_material("WOOD", 0).await;
    app.state
        .bom
        .add_line(product.id, wood.id, dec!(100), "kg".to_string())
        .await
        .unwrap();

    // No material on hand, creation still succeeds.
    let order = app
        .state
        .production_orders
        .create(order_input("PO-1", product.id, 10))
        .await
        .unwrap();
    assert_eq!(order.status, ProductionOrderStatus::Pending);
    assert!(order.start_date.is_none());

    let err = app
        .state
        .production_orders
        .create(order_input("PO-1", product.id, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateResource(_)));

    let err = app
        .state
        .production_orders
        .create(order_input("PO-2", 9999, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = app
        .state
        .production_orders
        .create(order_input("PO-3", product.id, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn start_then_complete_consumes_materials_and_builds_stock() {
    let app = TestApp::new().await;
    let product = app.seed_product("CHAIR", 3, 0).await;
    let wood = app.seed_material("WOOD", 1000).await;
    app.state
        .bom
        .add_line(product.id, wood.id, dec!(2.5), "kg".to_string())
        .await
        .unwrap();

    let order = app
        .state
        .production_orders
        .create(order_input("PO-1", product.id, 10))
        .await
        .unwrap();

    let started = app.state.production_orders.start(order.id).await.unwrap();
    assert_eq!(started.status, ProductionOrderStatus::InProduction);
    assert!(started.start_date.is_some());
    // Starting an order touches no stock.
    assert_eq!(app.state.raw_materials.get(wood.id).await.unwrap().stock, 1000);

    let completed = app
        .state
        .production_orders
        .complete(order.id)
        .await
        .unwrap();
    assert_eq!(completed.status, ProductionOrderStatus::Completed);
    assert!(completed.end_date.is_some());

    // 2.5 per unit x 10 units = 25, rounded up per line (already whole here).
    assert_eq!(app.state.raw_materials.get(wood.id).await.unwrap().stock, 975);
    assert_eq!(app.state.products.get(product.id).await.unwrap().stock, 13);
}

#[tokio::test]
async fn fractional_requirements_round_up_per_line() {
    let app = TestApp::new().await;
    let product = app.seed_product("CHAIR", 0, 0).await;
    let glue = app.seed_material("GLUE", 10).await;
    // 0.3 x 3 = 0.9 -> one whole unit leaves the shelf.
    app.state
        .bom
        .add_line(product.id, glue.id, dec!(0.3), "l".to_string())
        .await
        .unwrap();

    let order = app
        .state
        .production_orders
        .create(order_input("PO-1", product.id, 3))
        .await
        .unwrap();
    app.state.production_orders.start(order.id).await.unwrap();
    app.state.production_orders.complete(order.id).await.unwrap();

    assert_eq!(app.state.raw_materials.get(glue.id).await.unwrap().stock, 9);
}

#[tokio::test]
async fn start_fails_on_shortage_and_leaves_everything_unchanged() {
    let app = TestApp::new().await;
    let product = app.seed_product("CHAIR", 0, 0).await;
    let wood = app.seed_material("WOOD", 1000).await;
    // 200 per unit x 10 units = 2000 required, only 1000 on hand.
    app.state
        .bom
        .add_line(product.id, wood.id, dec!(200), "kg".to_string())
        .await
        .unwrap();

    let order = app
        .state
        .production_orders
        .create(order_input("PO-1", product.id, 10))
        .await
        .unwrap();

    let err = app.state.production_orders.start(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let reloaded = app.state.production_orders.get(order.id).await.unwrap();
    assert_eq!(reloaded.status, ProductionOrderStatus::Pending);
    assert!(reloaded.start_date.is_none());
    assert_eq!(app.state.raw_materials.get(wood.id).await.unwrap().stock, 1000);
}

#[tokio::test]
async fn complete_rolls_back_all_decrements_on_any_shortage() {
    let app = TestApp::new().await;
    let product = app.seed_product("CHAIR", 0, 0).await;
    let wood = app.seed_material("WOOD", 100).await;
    let glue = app.seed_material("GLUE", 10).await;
    app.state
        .bom
        .add_line(product.id, wood.id, dec!(5), "kg".to_string())
        .await
        .unwrap();
    app.state
        .bom
        .add_line(product.id, glue.id, dec!(1), "l".to_string())
        .await
        .unwrap();

    let order = app
        .state
        .production_orders
        .create(order_input("PO-1", product.id, 10))
        .await
        .unwrap();
    app.state.production_orders.start(order.id).await.unwrap();

    // Glue runs out between start and completion.
    let db = &*app.state.db;
    app.state
        .stock
        .decrease_material_stock(db, glue.id, 8)
        .await
        .unwrap();

    let err = app
        .state
        .production_orders
        .complete(order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    // Neither the wood decrement nor the product increment survived.
    assert_eq!(app.state.raw_materials.get(wood.id).await.unwrap().stock, 100);
    assert_eq!(app.state.raw_materials.get(glue.id).await.unwrap().stock, 2);
    assert_eq!(app.state.products.get(product.id).await.unwrap().stock, 0);
    let reloaded = app.state.production_orders.get(order.id).await.unwrap();
    assert_eq!(reloaded.status, ProductionOrderStatus::InProduction);
}

#[tokio::test]
async fn transition_and_mutation_guards() {
    let app = TestApp::new().await;
    let product = app.seed_product("CHAIR", 0, 0).await;

    let order = app
        .state
        .production_orders
        .create(order_input("PO-1", product.id, 2))
        .await
        .unwrap();

    // Completing before starting is not a valid transition.
    let err = app
        .state
        .production_orders
        .complete(order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));

    app.state.production_orders.start(order.id).await.unwrap();

    // An order already in production cannot be started again.
    let err = app.state.production_orders.start(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));

    // Nor deleted mid-flight.
    let err = app
        .state
        .production_orders
        .delete(order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));

    let cancelled = app.state.production_orders.cancel(order.id).await.unwrap();
    assert_eq!(cancelled.status, ProductionOrderStatus::Cancelled);

    // Terminal: no further cancel, update, or start.
    let err = app.state.production_orders.cancel(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::ImmutableState(_)));
    let err = app
        .state
        .production_orders
        .update(
            order.id,
            UpdateProductionOrderInput {
                quantity: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ImmutableState(_)));

    // Cancelled orders may be deleted.
    app.state.production_orders.delete(order.id).await.unwrap();
    let err = app.state.production_orders.get(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn update_revalidates_order_number_and_product() {
    let app = TestApp::new().await;
    let product = app.seed_product("CHAIR", 0, 0).await;

    let first = app
        .state
        .production_orders
        .create(order_input("PO-1", product.id, 2))
        .await
        .unwrap();
    app.state
        .production_orders
        .create(order_input("PO-2", product.id, 2))
        .await
        .unwrap();

    let err = app
        .state
        .production_orders
        .update(
            first.id,
            UpdateProductionOrderInput {
                order_number: Some("PO-2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateResource(_)));

    let err = app
        .state
        .production_orders
        .update(
            first.id,
            UpdateProductionOrderInput {
                product_id: Some(9999),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let updated = app
        .state
        .production_orders
        .update(
            first.id,
            UpdateProductionOrderInput {
                quantity: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.quantity, 7);
}

#[tokio::test]
async fn list_by_status_filters() {
    let app = TestApp::new().await;
    let product = app.seed_product("CHAIR", 0, 0).await;

    let a = app
        .state
        .production_orders
        .create(order_input("PO-1", product.id, 1))
        .await
        .unwrap();
    app.state
        .production_orders
        .create(order_input("PO-2", product.id, 1))
        .await
        .unwrap();
    app.state.production_orders.start(a.id).await.unwrap();

    let pending = app
        .state
        .production_orders
        .list_by_status(ProductionOrderStatus::Pending)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].order_number, "PO-2");

    let (all, total) = app.state.production_orders.list(0, 10).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(total, 2);
}
