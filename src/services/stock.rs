use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter,
};
use std::sync::Arc;
use tracing::{error, instrument};

use crate::{
    entities::{
        product::{self, Entity as ProductEntity},
        raw_material::{self, Entity as RawMaterialEntity},
    },
    errors::ServiceError,
};

/// Stock ledger for products and raw materials.
///
/// The mutating primitives take any `ConnectionTrait` so order services can
/// run them on their own transaction and have the whole operation commit or
/// roll back together. Reads between check and write are not row-locked:
/// sqlite serialises writers anyway, Postgres deployments should run these
/// under serializable isolation.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DatabaseConnection>,
}

impl StockService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Increments product stock and returns the updated row.
    #[instrument(skip(self, conn))]
    pub async fn increase_product_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: i64,
        quantity: i64,
    ) -> Result<product::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "Stock increase must be positive, got {}",
                quantity
            )));
        }

        let found = ProductEntity::find_by_id(product_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let new_stock = found.stock + quantity;
        let mut active: product::ActiveModel = found.into();
        active.stock = Set(new_stock);
        active.updated_at = Set(Utc::now().into());
        active.update(conn).await.map_err(|e| {
            error!("Failed to increase product stock: {}", e);
            ServiceError::db_error(e)
        })
    }

    /// Decrements product stock, failing without mutation when the on-hand
    /// quantity does not cover the request.
    #[instrument(skip(self, conn))]
    pub async fn decrease_product_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: i64,
        quantity: i64,
    ) -> Result<product::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "Stock decrease must be positive, got {}",
                quantity
            )));
        }

        let found = ProductEntity::find_by_id(product_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if found.stock < quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "Product {} has {} in stock, {} requested",
                found.code, found.stock, quantity
            )));
        }

        let new_stock = found.stock - quantity;
        let mut active: product::ActiveModel = found.into();
        active.stock = Set(new_stock);
        active.updated_at = Set(Utc::now().into());
        active.update(conn).await.map_err(|e| {
            error!("Failed to decrease product stock: {}", e);
            ServiceError::db_error(e)
        })
    }

    /// Increments raw-material stock and returns the updated row.
    #[instrument(skip(self, conn))]
    pub async fn increase_material_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        raw_material_id: i64,
        quantity: i64,
    ) -> Result<raw_material::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "Stock increase must be positive, got {}",
                quantity
            )));
        }

        let found = RawMaterialEntity::find_by_id(raw_material_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Raw material {} not found", raw_material_id))
            })?;

        let new_stock = found.stock + quantity;
        let mut active: raw_material::ActiveModel = found.into();
        active.stock = Set(new_stock);
        active.updated_at = Set(Utc::now().into());
        active.update(conn).await.map_err(|e| {
            error!("Failed to increase material stock: {}", e);
            ServiceError::db_error(e)
        })
    }

    /// Decrements raw-material stock, failing without mutation when the
    /// on-hand quantity does not cover the request.
    #[instrument(skip(self, conn))]
    pub async fn decrease_material_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        raw_material_id: i64,
        quantity: i64,
    ) -> Result<raw_material::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "Stock decrease must be positive, got {}",
                quantity
            )));
        }

        let found = RawMaterialEntity::find_by_id(raw_material_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Raw material {} not found", raw_material_id))
            })?;

        if found.stock < quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "Raw material {} has {} in stock, {} requested",
                found.code, found.stock, quantity
            )));
        }

        let new_stock = found.stock - quantity;
        let mut active: raw_material::ActiveModel = found.into();
        active.stock = Set(new_stock);
        active.updated_at = Set(Utc::now().into());
        active.update(conn).await.map_err(|e| {
            error!("Failed to decrease material stock: {}", e);
            ServiceError::db_error(e)
        })
    }

    /// Whether the product has at least `quantity` on hand.
    pub async fn is_product_available<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: i64,
        quantity: i64,
    ) -> Result<bool, ServiceError> {
        let found = ProductEntity::find_by_id(product_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        Ok(found.stock >= quantity)
    }

    /// Whether the raw material has at least `quantity` on hand.
    pub async fn is_material_available<C: ConnectionTrait>(
        &self,
        conn: &C,
        raw_material_id: i64,
        quantity: i64,
    ) -> Result<bool, ServiceError> {
        let found = RawMaterialEntity::find_by_id(raw_material_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Raw material {} not found", raw_material_id))
            })?;
        Ok(found.stock >= quantity)
    }

    /// Whether the product sits below its minimum stock threshold.
    pub async fn is_product_low_stock(&self, product_id: i64) -> Result<bool, ServiceError> {
        let db = &*self.db;
        let found = ProductEntity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        Ok(found.stock < found.stock_min)
    }

    /// Whether the raw material sits below its minimum stock threshold.
    pub async fn is_material_low_stock(&self, raw_material_id: i64) -> Result<bool, ServiceError> {
        let db = &*self.db;
        let found = RawMaterialEntity::find_by_id(raw_material_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Raw material {} not found", raw_material_id))
            })?;
        Ok(found.stock < found.stock_min)
    }

    /// All products below their minimum threshold, for replenishment scans.
    #[instrument(skip(self))]
    pub async fn low_stock_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        let db = &*self.db;
        ProductEntity::find()
            .filter(Expr::col(product::Column::Stock).lt(Expr::col(product::Column::StockMin)))
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// All raw materials below their minimum threshold.
    #[instrument(skip(self))]
    pub async fn low_stock_materials(&self) -> Result<Vec<raw_material::Model>, ServiceError> {
        let db = &*self.db;
        RawMaterialEntity::find()
            .filter(
                Expr::col(raw_material::Column::Stock)
                    .lt(Expr::col(raw_material::Column::StockMin)),
            )
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}
