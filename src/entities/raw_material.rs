use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Raw material consumed by production. Stock is tracked in whole units of
/// `unit`; fractional BOM requirements are rounded up at consumption time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "raw_materials")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub stock: i64,
    pub stock_min: i64,
    pub unit: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub unit_price: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bill_of_material::Entity")]
    BillOfMaterials,
    #[sea_orm(has_many = "super::supply_order_line::Entity")]
    SupplyOrderLines,
    #[sea_orm(has_many = "super::supplier_raw_material::Entity")]
    SupplierRawMaterials,
}

impl Related<super::bill_of_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillOfMaterials.def()
    }
}

impl Related<super::supply_order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplyOrderLines.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        super::supplier_raw_material::Relation::Supplier.def()
    }

    fn via() -> Option<RelationDef> {
        Some(
            super::supplier_raw_material::Relation::RawMaterial
                .def()
                .rev(),
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}
