#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::mpsc;

use supplyflow::{
    db::{self, DbConfig},
    entities::{customer, product, raw_material, supplier},
    events::{self, Event},
    services::{
        customers::CreateCustomerInput, products::CreateProductInput,
        raw_materials::CreateRawMaterialInput, suppliers::CreateSupplierInput,
    },
    AppState,
};

/// Application state backed by a fresh in-memory SQLite database.
pub struct TestApp {
    pub state: AppState,
    pub events: mpsc::Receiver<Event>,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            // A pool of in-memory SQLite connections would give every
            // connection its own private database.
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        let (sender, events) = events::channel(256);
        TestApp {
            state: AppState::new(Arc::new(pool), sender),
            events,
        }
    }

    pub async fn seed_product(&self, code: &str, stock: i64, stock_min: i64) -> product::Model {
        self.state
            .products
            .create(CreateProductInput {
                code: code.to_string(),
                name: format!("Product {}", code),
                description: None,
                stock,
                stock_min,
                unit_price: Decimal::new(1999, 2),
            })
            .await
            .expect("failed to seed product")
    }

    pub async fn seed_material(&self, code: &str, stock: i64) -> raw_material::Model {
        self.state
            .raw_materials
            .create(CreateRawMaterialInput {
                code: code.to_string(),
                name: format!("Material {}", code),
                stock,
                stock_min: 0,
                unit: "kg".to_string(),
                unit_price: Decimal::new(250, 2),
            })
            .await
            .expect("failed to seed raw material")
    }

    pub async fn seed_customer(&self, code: &str) -> customer::Model {
        self.state
            .customers
            .create(CreateCustomerInput {
                code: code.to_string(),
                name: format!("Customer {}", code),
                email: None,
                phone: None,
                address: None,
            })
            .await
            .expect("failed to seed customer")
    }

    pub async fn seed_supplier(&self, code: &str) -> supplier::Model {
        self.state
            .suppliers
            .create(CreateSupplierInput {
                code: code.to_string(),
                name: format!("Supplier {}", code),
                email: None,
                phone: None,
                rating: None,
                lead_time_days: None,
            })
            .await
            .expect("failed to seed supplier")
    }
}
