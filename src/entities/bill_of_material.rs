use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One recipe line: quantity of a raw material consumed per single unit of
/// the product. A product's full recipe is the set of its lines; a product
/// with no lines can be produced without consuming anything.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bill_of_materials")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_id: i64,
    pub raw_material_id: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub quantity: Decimal,
    pub unit: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::raw_material::Entity",
        from = "Column::RawMaterialId",
        to = "super::raw_material::Column::Id"
    )]
    RawMaterial,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::raw_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RawMaterial.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
