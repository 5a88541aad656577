use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<i32>,
    pub lead_time_days: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::supply_order::Entity")]
    SupplyOrders,
    #[sea_orm(has_many = "super::supplier_raw_material::Entity")]
    SupplierRawMaterials,
}

impl Related<super::supply_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplyOrders.def()
    }
}

impl Related<super::raw_material::Entity> for Entity {
    fn to() -> RelationDef {
        super::supplier_raw_material::Relation::RawMaterial.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::supplier_raw_material::Relation::Supplier.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
