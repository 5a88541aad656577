use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

use crate::{
    entities::{
        bill_of_material::{self, Entity as BomEntity},
        product::{self, Entity as ProductEntity},
    },
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub stock: i64,
    #[validate(range(min = 0))]
    pub stock_min: i64,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub stock_min: Option<i64>,
    pub unit_price: Option<Decimal>,
}

/// Product master data. Stock quantities are owned by the ledger; updates
/// here never touch the `stock` column.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateProductInput) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let duplicate = ProductEntity::find()
            .filter(product::Column::Code.eq(input.code.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::DuplicateResource(format!(
                "Product code {} already exists",
                input.code
            )));
        }

        let row = product::ActiveModel {
            code: Set(input.code),
            name: Set(input.name),
            description: Set(input.description),
            stock: Set(input.stock),
            stock_min: Set(input.stock_min),
            unit_price: Set(input.unit_price),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let created = row.insert(db).await.map_err(|e| {
            error!("Failed to create product: {}", e);
            ServiceError::db_error(e)
        })?;

        info!("Product created: id={}, code={}", created.id, created.code);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        product_id: i64,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let found = ProductEntity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let mut active: product::ActiveModel = found.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(stock_min) = input.stock_min {
            active.stock_min = Set(stock_min);
        }
        if let Some(unit_price) = input.unit_price {
            active.unit_price = Set(unit_price);
        }
        active.updated_at = Set(Utc::now().into());
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Rejected while any recipe still references the product.
    #[instrument(skip(self))]
    pub async fn delete(&self, product_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;

        ProductEntity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let referenced = BomEntity::find()
            .filter(bill_of_material::Column::ProductId.eq(product_id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if referenced > 0 {
            return Err(ServiceError::ValidationError(format!(
                "Product {} is referenced by {} BOM line(s) and cannot be deleted",
                product_id, referenced
            )));
        }

        ProductEntity::delete_by_id(product_id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    pub async fn get(&self, product_id: i64) -> Result<product::Model, ServiceError> {
        let db = &*self.db;
        ProductEntity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    pub async fn get_by_code(&self, code: &str) -> Result<product::Model, ServiceError> {
        let db = &*self.db;
        ProductEntity::find()
            .filter(product::Column::Code.eq(code))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product code {} not found", code)))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let db = &*self.db;
        let paginator = ProductEntity::find()
            .order_by_asc(product::Column::Id)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page)
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }
}
