//! Supplyflow
//!
//! Transactional supply-chain core: product and raw-material master data,
//! bill-of-material resolution, production orders, customer delivery orders
//! with shipments, and supplier orders, all backed by a single stock ledger.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

/// All services wired against one connection pool and one event channel.
///
/// Cloning is cheap; every service holds `Arc`s internally.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub event_sender: events::EventSender,
    pub products: services::products::ProductService,
    pub raw_materials: services::raw_materials::RawMaterialService,
    pub customers: services::customers::CustomerService,
    pub suppliers: services::suppliers::SupplierService,
    pub bom: services::bom::BomService,
    pub stock: services::stock::StockService,
    pub production_orders: services::production_orders::ProductionOrderService,
    pub delivery_orders: services::delivery_orders::DeliveryOrderService,
    pub deliveries: services::deliveries::DeliveryService,
    pub supply_orders: services::supply_orders::SupplyOrderService,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: events::EventSender) -> Self {
        let sender = Some(event_sender.clone());
        Self {
            products: services::products::ProductService::new(db.clone()),
            raw_materials: services::raw_materials::RawMaterialService::new(db.clone()),
            customers: services::customers::CustomerService::new(db.clone()),
            suppliers: services::suppliers::SupplierService::new(db.clone()),
            bom: services::bom::BomService::new(db.clone()),
            stock: services::stock::StockService::new(db.clone()),
            production_orders: services::production_orders::ProductionOrderService::new(
                db.clone(),
                sender.clone(),
            ),
            delivery_orders: services::delivery_orders::DeliveryOrderService::new(
                db.clone(),
                sender.clone(),
            ),
            deliveries: services::deliveries::DeliveryService::new(db.clone(), sender.clone()),
            supply_orders: services::supply_orders::SupplyOrderService::new(db.clone(), sender),
            db,
            event_sender,
        }
    }
}
