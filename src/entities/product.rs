use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Finished product. `stock` is the on-hand finished-goods quantity and must
/// stay non-negative; all mutations go through the stock ledger service.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub stock: i64,
    pub stock_min: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub unit_price: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bill_of_material::Entity")]
    BillOfMaterials,
    #[sea_orm(has_many = "super::production_order::Entity")]
    ProductionOrders,
    #[sea_orm(has_many = "super::delivery_order_line::Entity")]
    DeliveryOrderLines,
}

impl Related<super::bill_of_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillOfMaterials.def()
    }
}

impl Related<super::production_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionOrders.def()
    }
}

impl Related<super::delivery_order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryOrderLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
