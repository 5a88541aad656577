use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supply_order_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub supply_order_id: i64,
    pub raw_material_id: i64,
    pub quantity: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub unit_price: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Line total: quantity times unit price.
    pub fn total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supply_order::Entity",
        from = "Column::SupplyOrderId",
        to = "super::supply_order::Column::Id"
    )]
    SupplyOrder,
    #[sea_orm(
        belongs_to = "super::raw_material::Entity",
        from = "Column::RawMaterialId",
        to = "super::raw_material::Column::Id"
    )]
    RawMaterial,
}

impl Related<super::supply_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplyOrder.def()
    }
}

impl Related<super::raw_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RawMaterial.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
