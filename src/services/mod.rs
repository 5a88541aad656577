//! Service layer. Each service owns one aggregate and runs every
//! check-then-mutate sequence inside a single transaction.

pub mod bom;
pub mod customers;
pub mod deliveries;
pub mod delivery_orders;
pub mod production_orders;
pub mod products;
pub mod raw_materials;
pub mod stock;
pub mod suppliers;
pub mod supply_orders;
