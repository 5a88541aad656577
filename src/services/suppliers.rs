use chrono::Utc;
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
        supplier::{self, Entity as SupplierEntity},
        supply_order::{self, Entity as SupplyOrderEntity},
    },
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(range(min = 0, max = 5))]
    pub rating: Option<i32>,
    #[validate(range(min = 0))]
    pub lead_time_days: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSupplierInput {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(range(min = 0, max = 5))]
    pub rating: Option<i32>,
    #[validate(range(min = 0))]
    pub lead_time_days: Option<i32>,
}

#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DatabaseConnection>,
}

impl SupplierService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        input: CreateSupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let duplicate = SupplierEntity::find()
            .filter(supplier::Column::Code.eq(input.code.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::DuplicateResource(format!(
                "Supplier code {} already exists",
                input.code
            )));
        }

        let row = supplier::ActiveModel {
            code: Set(input.code),
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            rating: Set(input.rating),
            lead_time_days: Set(input.lead_time_days),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let created = row.insert(db).await.map_err(|e| {
            error!("Failed to create supplier: {}", e);
            ServiceError::db_error(e)
        })?;

        info!("Supplier created: id={}, code={}", created.id, created.code);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        supplier_id: i64,
        input: UpdateSupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let found = SupplierEntity::find_by_id(supplier_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
            })?;

        let mut active: supplier::ActiveModel = found.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(email) = input.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(rating) = input.rating {
            active.rating = Set(Some(rating));
        }
        if let Some(lead_time_days) = input.lead_time_days {
            active.lead_time_days = Set(Some(lead_time_days));
        }
        active.updated_at = Set(Utc::now().into());
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Rejected while the supplier still has supply orders.
    #[instrument(skip(self))]
    pub async fn delete(&self, supplier_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;

        SupplierEntity::find_by_id(supplier_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
            })?;

        let orders = SupplyOrderEntity::find()
            .filter(supply_order::Column::SupplierId.eq(supplier_id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if orders > 0 {
            return Err(ServiceError::ValidationError(format!(
                "Supplier {} has {} supply order(s) and cannot be deleted",
                supplier_id, orders
            )));
        }

        SupplierEntity::delete_by_id(supplier_id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    pub async fn get(&self, supplier_id: i64) -> Result<supplier::Model, ServiceError> {
        let db = &*self.db;
        SupplierEntity::find_by_id(supplier_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", supplier_id)))
    }

    pub async fn get_by_code(&self, code: &str) -> Result<supplier::Model, ServiceError> {
        let db = &*self.db;
        SupplierEntity::find()
            .filter(supplier::Column::Code.eq(code))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier code {} not found", code)))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let db = &*self.db;
        let paginator = SupplierEntity::find()
            .order_by_asc(supplier::Column::Id)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page)
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }
}
