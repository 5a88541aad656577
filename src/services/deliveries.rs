use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

use crate::{
    entities::{
        delivery::{self, DeliveryStatus, Entity as DeliveryEntity},
        delivery_order::Entity as DeliveryOrderEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDeliveryInput {
    #[validate(length(min = 1, max = 64))]
    pub delivery_number: String,
    pub delivery_order_id: i64,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDeliveryInput {
    #[validate(length(min = 1, max = 64))]
    pub delivery_number: Option<String>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
}

fn status_rank(status: DeliveryStatus) -> u8 {
    match status {
        DeliveryStatus::Planned => 0,
        DeliveryStatus::InTransit => 1,
        DeliveryStatus::Delivered => 2,
        DeliveryStatus::Cancelled => 3,
    }
}

/// Shipment attached to a delivery order, at most one per order.
/// Planned -> InTransit -> Delivered, Cancelled from any non-terminal state;
/// terminal shipments accept no mutation at all.
#[derive(Clone)]
pub struct DeliveryService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl DeliveryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        input: CreateDeliveryInput,
    ) -> Result<delivery::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        DeliveryOrderEntity::find_by_id(input.delivery_order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Delivery order {} not found",
                    input.delivery_order_id
                ))
            })?;

        let existing = DeliveryEntity::find()
            .filter(delivery::Column::DeliveryOrderId.eq(input.delivery_order_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::DuplicateResource(format!(
                "Delivery order {} already has a delivery",
                input.delivery_order_id
            )));
        }

        let duplicate = DeliveryEntity::find()
            .filter(delivery::Column::DeliveryNumber.eq(input.delivery_number.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::DuplicateResource(format!(
                "Delivery number {} already exists",
                input.delivery_number
            )));
        }

        let row = delivery::ActiveModel {
            delivery_number: Set(input.delivery_number),
            delivery_order_id: Set(input.delivery_order_id),
            status: Set(DeliveryStatus::Planned),
            carrier: Set(input.carrier),
            tracking_number: Set(input.tracking_number),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let created = row.insert(db).await.map_err(|e| {
            error!("Failed to create delivery: {}", e);
            ServiceError::db_error(e)
        })?;

        counter!("deliveries.created", 1);
        info!(
            "Delivery created: id={}, delivery_order_id={}",
            created.id, created.delivery_order_id
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::DeliveryCreated {
                    delivery_id: created.id,
                    delivery_order_id: created.delivery_order_id,
                })
                .await;
        }

        Ok(created)
    }

    /// Forward transitions only; Delivered stamps the actual delivery date.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        delivery_id: i64,
        new_status: DeliveryStatus,
    ) -> Result<delivery::Model, ServiceError> {
        let db = &*self.db;

        let found = DeliveryEntity::find_by_id(delivery_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Delivery {} not found", delivery_id))
            })?;

        match found.status {
            DeliveryStatus::Delivered => {
                return Err(ServiceError::InvalidTransition(format!(
                    "Delivery {} is already delivered",
                    delivery_id
                )));
            }
            DeliveryStatus::Cancelled => {
                return Err(ServiceError::InvalidTransition(format!(
                    "Delivery {} is already cancelled",
                    delivery_id
                )));
            }
            _ => {}
        }

        if new_status != DeliveryStatus::Cancelled
            && status_rank(new_status) <= status_rank(found.status)
        {
            return Err(ServiceError::InvalidTransition(format!(
                "Delivery {} cannot move from {} to {}",
                delivery_id, found.status, new_status
            )));
        }

        let mut active: delivery::ActiveModel = found.into();
        active.status = Set(new_status);
        if new_status == DeliveryStatus::Delivered {
            active.actual_delivery_date = Set(Some(Utc::now().into()));
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!("Delivery {} moved to {}", delivery_id, new_status);

        if let Some(sender) = &self.event_sender {
            if new_status == DeliveryStatus::Delivered {
                sender
                    .send_or_log(Event::DeliveryDelivered { delivery_id })
                    .await;
            }
        }

        Ok(updated)
    }

    /// Convenience transition straight to Delivered.
    #[instrument(skip(self))]
    pub async fn mark_as_delivered(
        &self,
        delivery_id: i64,
    ) -> Result<delivery::Model, ServiceError> {
        self.update_status(delivery_id, DeliveryStatus::Delivered)
            .await
    }

    /// Rewrites carrier details. Terminal shipments are immutable.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        delivery_id: i64,
        input: UpdateDeliveryInput,
    ) -> Result<delivery::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let found = DeliveryEntity::find_by_id(delivery_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Delivery {} not found", delivery_id))
            })?;

        if found.status.is_terminal() {
            return Err(ServiceError::ImmutableState(format!(
                "Delivery {} is {} and cannot be updated",
                delivery_id, found.status
            )));
        }

        if let Some(delivery_number) = &input.delivery_number {
            let clash = DeliveryEntity::find()
                .filter(delivery::Column::DeliveryNumber.eq(delivery_number.clone()))
                .filter(delivery::Column::Id.ne(delivery_id))
                .one(db)
                .await
                .map_err(ServiceError::db_error)?;
            if clash.is_some() {
                return Err(ServiceError::DuplicateResource(format!(
                    "Delivery number {} already exists",
                    delivery_number
                )));
            }
        }

        let mut active: delivery::ActiveModel = found.into();
        if let Some(delivery_number) = input.delivery_number {
            active.delivery_number = Set(delivery_number);
        }
        if let Some(carrier) = input.carrier {
            active.carrier = Set(Some(carrier));
        }
        if let Some(tracking_number) = input.tracking_number {
            active.tracking_number = Set(Some(tracking_number));
        }
        active.updated_at = Set(Utc::now().into());
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Deletes a shipment still in flight planning. Terminal shipments stay.
    #[instrument(skip(self))]
    pub async fn delete(&self, delivery_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;

        let found = DeliveryEntity::find_by_id(delivery_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Delivery {} not found", delivery_id))
            })?;

        if found.status.is_terminal() {
            return Err(ServiceError::ImmutableState(format!(
                "Delivery {} is {} and cannot be deleted",
                delivery_id, found.status
            )));
        }

        DeliveryEntity::delete_by_id(delivery_id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    pub async fn get(&self, delivery_id: i64) -> Result<delivery::Model, ServiceError> {
        let db = &*self.db;
        DeliveryEntity::find_by_id(delivery_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Delivery {} not found", delivery_id)))
    }

    pub async fn get_by_order(
        &self,
        delivery_order_id: i64,
    ) -> Result<Option<delivery::Model>, ServiceError> {
        let db = &*self.db;
        DeliveryEntity::find()
            .filter(delivery::Column::DeliveryOrderId.eq(delivery_order_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)
    }
}
