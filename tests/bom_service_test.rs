//! BOM resolver tests: line maintenance, requirement math, availability.

mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use supplyflow::errors::ServiceError;

#[tokio::test]
async fn add_line_validates_references_and_uniqueness() {
    let app = TestApp::new().await;
    let product = app.seed_product("CHAIR", 0, 0).await;
    let wood = app.seed_material("WOOD", 100).await;

    app.state
        .bom
        .add_line(product.id, wood.id, dec!(4), "kg".to_string())
        .await
        .unwrap();

    let err = app
        .state
        .bom
        .add_line(product.id, wood.id, dec!(2), "kg".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateResource(_)));

    let err = app
        .state
        .bom
        .add_line(9999, wood.id, dec!(1), "kg".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = app
        .state
        .bom
        .add_line(product.id, 9999, dec!(1), "kg".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = app
        .state
        .bom
        .add_line(product.id, wood.id, dec!(0), "kg".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn required_materials_scales_line_quantities_unrounded() {
    let app = TestApp::new().await;
    let product = app.seed_product("CHAIR", 0, 0).await;
    let wood = app.seed_material("WOOD", 1000).await;
    let glue = app.seed_material("GLUE", 50).await;

    app.state
        .bom
        .add_line(product.id, wood.id, dec!(2.5), "kg".to_string())
        .await
        .unwrap();
    app.state
        .bom
        .add_line(product.id, glue.id, dec!(0.3), "l".to_string())
        .await
        .unwrap();

    let db = &*app.state.db;
    let requirements = app
        .state
        .bom
        .required_materials(db, product.id, 10)
        .await
        .unwrap();

    assert_eq!(requirements.len(), 2);
    let wood_req = requirements
        .iter()
        .find(|r| r.raw_material_id == wood.id)
        .unwrap();
    assert_eq!(wood_req.required, dec!(25));
    assert_eq!(wood_req.available, 1000);

    let glue_req = requirements
        .iter()
        .find(|r| r.raw_material_id == glue.id)
        .unwrap();
    // 0.3 x 10 stays exact, no rounding at resolution time.
    assert_eq!(glue_req.required, dec!(3.0));
}

#[tokio::test]
async fn product_without_recipe_requires_nothing() {
    let app = TestApp::new().await;
    let product = app.seed_product("SIMPLE", 0, 0).await;
    let db = &*app.state.db;

    let requirements = app
        .state
        .bom
        .required_materials(db, product.id, 10)
        .await
        .unwrap();
    assert!(requirements.is_empty());

    let availability = app
        .state
        .bom
        .check_availability(db, product.id, 10)
        .await
        .unwrap();
    assert!(availability.can_produce);
}

#[tokio::test]
async fn check_availability_reports_shortages_per_material() {
    let app = TestApp::new().await;
    let product = app.seed_product("CHAIR", 0, 0).await;
    let wood = app.seed_material("WOOD", 1000).await;
    let glue = app.seed_material("GLUE", 2).await;

    app.state
        .bom
        .add_line(product.id, wood.id, dec!(2.5), "kg".to_string())
        .await
        .unwrap();
    app.state
        .bom
        .add_line(product.id, glue.id, dec!(0.5), "l".to_string())
        .await
        .unwrap();

    let db = &*app.state.db;
    let availability = app
        .state
        .bom
        .check_availability(db, product.id, 10)
        .await
        .unwrap();

    assert!(!availability.can_produce);
    assert_eq!(availability.shortages.len(), 1);
    let shortage = &availability.shortages[0];
    assert_eq!(shortage.raw_material_id, glue.id);
    assert_eq!(shortage.required, dec!(5.0));
    assert_eq!(shortage.available, 2);
    assert_eq!(shortage.shortage, dec!(3.0));
}

#[tokio::test]
async fn total_and_line_maintenance() {
    let app = TestApp::new().await;
    let product = app.seed_product("CHAIR", 0, 0).await;
    let wood = app.seed_material("WOOD", 100).await;
    let glue = app.seed_material("GLUE", 100).await;

    let wood_line = app
        .state
        .bom
        .add_line(product.id, wood.id, dec!(4), "kg".to_string())
        .await
        .unwrap();
    app.state
        .bom
        .add_line(product.id, glue.id, dec!(0.5), "l".to_string())
        .await
        .unwrap();

    let total = app
        .state
        .bom
        .total_raw_material_quantity(product.id)
        .await
        .unwrap();
    assert_eq!(total, dec!(4.5));

    app.state
        .bom
        .update_line_quantity(wood_line.id, dec!(3))
        .await
        .unwrap();
    let total = app
        .state
        .bom
        .total_raw_material_quantity(product.id)
        .await
        .unwrap();
    assert_eq!(total, dec!(3.5));

    app.state.bom.remove_line(wood_line.id).await.unwrap();
    let lines = app.state.bom.lines_for_product(product.id).await.unwrap();
    assert_eq!(lines.len(), 1);

    let err = app.state.bom.remove_line(wood_line.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
