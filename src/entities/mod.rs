pub mod bill_of_material;
pub mod customer;
pub mod delivery;
pub mod delivery_order;
pub mod delivery_order_line;
pub mod product;
pub mod production_order;
pub mod raw_material;
pub mod supplier;
pub mod supplier_raw_material;
pub mod supply_order;
pub mod supply_order_line;
