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
        raw_material::{self, Entity as RawMaterialEntity},
        supplier::{self, Entity as SupplierEntity},
        supplier_raw_material::{self, Entity as SupplierRawMaterialEntity},
    },
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRawMaterialInput {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0))]
    pub stock: i64,
    #[validate(range(min = 0))]
    pub stock_min: i64,
    #[validate(length(min = 1, max = 16))]
    pub unit: String,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRawMaterialInput {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(range(min = 0))]
    pub stock_min: Option<i64>,
    #[validate(length(min = 1, max = 16))]
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
}

/// Raw-material master data, including the supplier catalogue links.
/// Stock quantities are owned by the ledger.
#[derive(Clone)]
pub struct RawMaterialService {
    db: Arc<DatabaseConnection>,
}

impl RawMaterialService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        input: CreateRawMaterialInput,
    ) -> Result<raw_material::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let duplicate = RawMaterialEntity::find()
            .filter(raw_material::Column::Code.eq(input.code.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::DuplicateResource(format!(
                "Raw material code {} already exists",
                input.code
            )));
        }

        let row = raw_material::ActiveModel {
            code: Set(input.code),
            name: Set(input.name),
            stock: Set(input.stock),
            stock_min: Set(input.stock_min),
            unit: Set(input.unit),
            unit_price: Set(input.unit_price),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let created = row.insert(db).await.map_err(|e| {
            error!("Failed to create raw material: {}", e);
            ServiceError::db_error(e)
        })?;

        info!(
            "Raw material created: id={}, code={}",
            created.id, created.code
        );
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        raw_material_id: i64,
        input: UpdateRawMaterialInput,
    ) -> Result<raw_material::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let found = RawMaterialEntity::find_by_id(raw_material_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Raw material {} not found", raw_material_id))
            })?;

        let mut active: raw_material::ActiveModel = found.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(stock_min) = input.stock_min {
            active.stock_min = Set(stock_min);
        }
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(unit_price) = input.unit_price {
            active.unit_price = Set(unit_price);
        }
        active.updated_at = Set(Utc::now().into());
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Rejected while any recipe still references the material.
    #[instrument(skip(self))]
    pub async fn delete(&self, raw_material_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;

        RawMaterialEntity::find_by_id(raw_material_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Raw material {} not found", raw_material_id))
            })?;

        let referenced = BomEntity::find()
            .filter(bill_of_material::Column::RawMaterialId.eq(raw_material_id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if referenced > 0 {
            return Err(ServiceError::ValidationError(format!(
                "Raw material {} is referenced by {} BOM line(s) and cannot be deleted",
                raw_material_id, referenced
            )));
        }

        RawMaterialEntity::delete_by_id(raw_material_id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    /// Records that a supplier carries this material.
    #[instrument(skip(self))]
    pub async fn link_supplier(
        &self,
        raw_material_id: i64,
        supplier_id: i64,
    ) -> Result<(), ServiceError> {
        let db = &*self.db;

        RawMaterialEntity::find_by_id(raw_material_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Raw material {} not found", raw_material_id))
            })?;
        SupplierEntity::find_by_id(supplier_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
            })?;

        let existing = SupplierRawMaterialEntity::find_by_id((supplier_id, raw_material_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::DuplicateResource(format!(
                "Supplier {} already linked to raw material {}",
                supplier_id, raw_material_id
            )));
        }

        let link = supplier_raw_material::ActiveModel {
            supplier_id: Set(supplier_id),
            raw_material_id: Set(raw_material_id),
        };
        link.insert(db).await.map_err(ServiceError::db_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn unlink_supplier(
        &self,
        raw_material_id: i64,
        supplier_id: i64,
    ) -> Result<(), ServiceError> {
        let db = &*self.db;

        let existing = SupplierRawMaterialEntity::find_by_id((supplier_id, raw_material_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Supplier {} is not linked to raw material {}",
                    supplier_id, raw_material_id
                ))
            })?;

        SupplierRawMaterialEntity::delete_by_id((existing.supplier_id, existing.raw_material_id))
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    /// Suppliers carrying this material.
    #[instrument(skip(self))]
    pub async fn suppliers(
        &self,
        raw_material_id: i64,
    ) -> Result<Vec<supplier::Model>, ServiceError> {
        let db = &*self.db;

        let links = SupplierRawMaterialEntity::find()
            .filter(supplier_raw_material::Column::RawMaterialId.eq(raw_material_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut suppliers = Vec::with_capacity(links.len());
        for link in links {
            if let Some(found) = SupplierEntity::find_by_id(link.supplier_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
            {
                suppliers.push(found);
            }
        }
        Ok(suppliers)
    }

    pub async fn get(&self, raw_material_id: i64) -> Result<raw_material::Model, ServiceError> {
        let db = &*self.db;
        RawMaterialEntity::find_by_id(raw_material_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Raw material {} not found", raw_material_id))
            })
    }

    pub async fn get_by_code(&self, code: &str) -> Result<raw_material::Model, ServiceError> {
        let db = &*self.db;
        RawMaterialEntity::find()
            .filter(raw_material::Column::Code.eq(code))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Raw material code {} not found", code))
            })
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<raw_material::Model>, u64), ServiceError> {
        let db = &*self.db;
        let paginator = RawMaterialEntity::find()
            .order_by_asc(raw_material::Column::Id)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page)
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }
}
