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
        customer::{self, Entity as CustomerEntity},
        delivery_order::{self, Entity as DeliveryOrderEntity},
    },
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        input: CreateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let duplicate = CustomerEntity::find()
            .filter(customer::Column::Code.eq(input.code.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::DuplicateResource(format!(
                "Customer code {} already exists",
                input.code
            )));
        }

        let row = customer::ActiveModel {
            code: Set(input.code),
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let created = row.insert(db).await.map_err(|e| {
            error!("Failed to create customer: {}", e);
            ServiceError::db_error(e)
        })?;

        info!("Customer created: id={}, code={}", created.id, created.code);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        customer_id: i64,
        input: UpdateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let found = CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", customer_id))
            })?;

        let mut active: customer::ActiveModel = found.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(email) = input.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        active.updated_at = Set(Utc::now().into());
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Rejected while the customer still has delivery orders.
    #[instrument(skip(self))]
    pub async fn delete(&self, customer_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;

        CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", customer_id))
            })?;

        let orders = DeliveryOrderEntity::find()
            .filter(delivery_order::Column::CustomerId.eq(customer_id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if orders > 0 {
            return Err(ServiceError::ValidationError(format!(
                "Customer {} has {} delivery order(s) and cannot be deleted",
                customer_id, orders
            )));
        }

        CustomerEntity::delete_by_id(customer_id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    pub async fn get(&self, customer_id: i64) -> Result<customer::Model, ServiceError> {
        let db = &*self.db;
        CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))
    }

    pub async fn get_by_code(&self, code: &str) -> Result<customer::Model, ServiceError> {
        let db = &*self.db;
        CustomerEntity::find()
            .filter(customer::Column::Code.eq(code))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer code {} not found", code)))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let db = &*self.db;
        let paginator = CustomerEntity::find()
            .order_by_asc(customer::Column::Id)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page)
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }
}
