use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Join table for the supplier / raw-material many-to-many association.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supplier_raw_materials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub supplier_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub raw_material_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(
        belongs_to = "super::raw_material::Entity",
        from = "Column::RawMaterialId",
        to = "super::raw_material::Column::Id"
    )]
    RawMaterial,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::raw_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RawMaterial.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
