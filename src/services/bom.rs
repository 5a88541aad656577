use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, ModelTrait, QueryFilter,
};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::{
    entities::{
        bill_of_material::{self, Entity as BomEntity},
        product::Entity as ProductEntity,
        raw_material::Entity as RawMaterialEntity,
    },
    errors::ServiceError,
};

/// One raw material needed to produce a given product quantity.
///
/// `required` is the exact per-recipe amount (line quantity times produced
/// units, unrounded); `available` is the on-hand stock at read time.
#[derive(Debug, Clone)]
pub struct MaterialRequirement {
    pub raw_material_id: i64,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub required: Decimal,
    pub available: i64,
}

#[derive(Debug, Clone)]
pub struct MaterialShortage {
    pub raw_material_id: i64,
    pub code: String,
    pub required: Decimal,
    pub available: i64,
    pub shortage: Decimal,
}

#[derive(Debug, Clone)]
pub struct MaterialAvailability {
    pub can_produce: bool,
    pub shortages: Vec<MaterialShortage>,
}

/// Bill-of-material resolver: maintains product recipes and answers
/// "what does it take to build N units".
#[derive(Clone)]
pub struct BomService {
    db: Arc<DatabaseConnection>,
}

impl BomService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Adds a recipe line. A product references a given material at most once.
    #[instrument(skip(self))]
    pub async fn add_line(
        &self,
        product_id: i64,
        raw_material_id: i64,
        quantity: Decimal,
        unit: String,
    ) -> Result<bill_of_material::Model, ServiceError> {
        let db = &*self.db;

        if quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "BOM line quantity must be positive, got {}",
                quantity
            )));
        }

        ProductEntity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        RawMaterialEntity::find_by_id(raw_material_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Raw material {} not found", raw_material_id))
            })?;

        let existing = BomEntity::find()
            .filter(bill_of_material::Column::ProductId.eq(product_id))
            .filter(bill_of_material::Column::RawMaterialId.eq(raw_material_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::DuplicateResource(format!(
                "Product {} already has a BOM line for raw material {}",
                product_id, raw_material_id
            )));
        }

        let line = bill_of_material::ActiveModel {
            product_id: Set(product_id),
            raw_material_id: Set(raw_material_id),
            quantity: Set(quantity),
            unit: Set(unit),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let created = line.insert(db).await.map_err(|e| {
            error!("Failed to add BOM line: {}", e);
            ServiceError::db_error(e)
        })?;

        info!(
            "BOM line added: product_id={}, raw_material_id={}, quantity={}",
            product_id, raw_material_id, created.quantity
        );
        Ok(created)
    }

    /// Changes the per-unit quantity of an existing line.
    #[instrument(skip(self))]
    pub async fn update_line_quantity(
        &self,
        line_id: i64,
        quantity: Decimal,
    ) -> Result<bill_of_material::Model, ServiceError> {
        let db = &*self.db;

        if quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "BOM line quantity must be positive, got {}",
                quantity
            )));
        }

        let found = BomEntity::find_by_id(line_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("BOM line {} not found", line_id)))?;

        let mut active: bill_of_material::ActiveModel = found.into();
        active.quantity = Set(quantity);
        active.updated_at = Set(Utc::now().into());
        active.update(db).await.map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn remove_line(&self, line_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;

        let found = BomEntity::find_by_id(line_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("BOM line {} not found", line_id)))?;

        found.delete(db).await.map_err(ServiceError::db_error)?;
        Ok(())
    }

    /// All recipe lines for a product.
    #[instrument(skip(self))]
    pub async fn lines_for_product(
        &self,
        product_id: i64,
    ) -> Result<Vec<bill_of_material::Model>, ServiceError> {
        let db = &*self.db;
        BomEntity::find()
            .filter(bill_of_material::Column::ProductId.eq(product_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Resolves the full material requirement for producing `produced_qty`
    /// units. Empty for a product with no recipe.
    pub async fn required_materials<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: i64,
        produced_qty: i64,
    ) -> Result<Vec<MaterialRequirement>, ServiceError> {
        let lines = BomEntity::find()
            .filter(bill_of_material::Column::ProductId.eq(product_id))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?;

        let mut requirements = Vec::with_capacity(lines.len());
        for line in lines {
            let material = RawMaterialEntity::find_by_id(line.raw_material_id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Raw material {} not found",
                        line.raw_material_id
                    ))
                })?;

            requirements.push(MaterialRequirement {
                raw_material_id: material.id,
                code: material.code,
                name: material.name,
                unit: line.unit,
                required: line.quantity * Decimal::from(produced_qty),
                available: material.stock,
            });
        }

        Ok(requirements)
    }

    /// Sum of recipe line quantities for one produced unit (reporting).
    #[instrument(skip(self))]
    pub async fn total_raw_material_quantity(
        &self,
        product_id: i64,
    ) -> Result<Decimal, ServiceError> {
        let lines = self.lines_for_product(product_id).await?;
        Ok(lines.iter().map(|l| l.quantity).sum())
    }

    /// Checks whether current material stock covers producing `produced_qty`
    /// units, with per-material shortage detail.
    pub async fn check_availability<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: i64,
        produced_qty: i64,
    ) -> Result<MaterialAvailability, ServiceError> {
        let requirements = self
            .required_materials(conn, product_id, produced_qty)
            .await?;

        let mut shortages = Vec::new();
        for req in &requirements {
            let available = Decimal::from(req.available);
            if available < req.required {
                shortages.push(MaterialShortage {
                    raw_material_id: req.raw_material_id,
                    code: req.code.clone(),
                    required: req.required,
                    available: req.available,
                    shortage: req.required - available,
                });
            }
        }

        Ok(MaterialAvailability {
            can_produce: shortages.is_empty(),
            shortages,
        })
    }
}
