use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

use crate::{
    entities::{
        customer::Entity as CustomerEntity,
        delivery::Entity as DeliveryEntity,
        delivery_order::{self, DeliveryOrderStatus, Entity as DeliveryOrderEntity},
        delivery_order_line::{self, Entity as DeliveryOrderLineEntity},
        product::Entity as ProductEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock::StockService,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeliveryOrderLineInput {
    pub product_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i64,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDeliveryOrderInput {
    #[validate(length(min = 1, max = 64))]
    pub order_number: String,
    pub customer_id: i64,
    pub expected_delivery_date: Option<chrono::DateTime<chrono::FixedOffset>>,
    #[validate]
    pub lines: Vec<DeliveryOrderLineInput>,
}

/// Customer delivery orders: Preparing -> EnRoute -> Delivered, with
/// Cancelled reachable from any non-terminal state.
///
/// Availability is checked at creation but stock is only consumed when the
/// order transitions to Delivered. Between those two points nothing is
/// reserved, so two orders can both pass the creation check against the same
/// units.
#[derive(Clone)]
pub struct DeliveryOrderService {
    db: Arc<DatabaseConnection>,
    stock: StockService,
    event_sender: Option<EventSender>,
}

impl DeliveryOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self {
            stock: StockService::new(db.clone()),
            db,
            event_sender,
        }
    }

    /// Creates the order with its lines in one transaction. An order always
    /// carries at least one line; every line's product must exist and
    /// currently cover the line quantity. Nothing is decremented here.
    #[instrument(skip(self, input), fields(order_number = %input.order_number))]
    pub async fn create(
        &self,
        input: CreateDeliveryOrderInput,
    ) -> Result<delivery_order::Model, ServiceError> {
        input.validate()?;
        if input.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "Delivery order must have at least one line".to_string(),
            ));
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let duplicate = DeliveryOrderEntity::find()
            .filter(delivery_order::Column::OrderNumber.eq(input.order_number.clone()))
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::DuplicateResource(format!(
                "Delivery order number {} already exists",
                input.order_number
            )));
        }

        CustomerEntity::find_by_id(input.customer_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", input.customer_id))
            })?;

        for line in &input.lines {
            let product = ProductEntity::find_by_id(line.product_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", line.product_id))
                })?;
            if product.stock < line.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "Product {} has {} in stock, {} requested",
                    product.code, product.stock, line.quantity
                )));
            }
        }

        let order = delivery_order::ActiveModel {
            order_number: Set(input.order_number),
            customer_id: Set(input.customer_id),
            status: Set(DeliveryOrderStatus::Preparing),
            expected_delivery_date: Set(input.expected_delivery_date),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let created = order.insert(&txn).await.map_err(|e| {
            error!("Failed to create delivery order: {}", e);
            ServiceError::db_error(e)
        })?;

        for line in &input.lines {
            let row = delivery_order_line::ActiveModel {
                delivery_order_id: Set(created.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                created_at: Set(Utc::now().into()),
                updated_at: Set(Utc::now().into()),
                ..Default::default()
            };
            row.insert(&txn).await.map_err(ServiceError::db_error)?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("delivery_orders.created", 1);
        info!(
            "Delivery order created: id={}, customer_id={}, lines={}",
            created.id,
            created.customer_id,
            input.lines.len()
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::DeliveryOrderCreated {
                    order_id: created.id,
                    customer_id: created.customer_id,
                })
                .await;
        }

        Ok(created)
    }

    /// Moves the order forward through its lifecycle. Delivering consumes
    /// product stock line by line in the same transaction and stamps the
    /// actual delivery date; terminal orders reject any change.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: i64,
        new_status: DeliveryOrderStatus,
    ) -> Result<delivery_order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let order = DeliveryOrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Delivery order {} not found", order_id))
            })?;

        match order.status {
            DeliveryOrderStatus::Delivered => {
                return Err(ServiceError::InvalidTransition(format!(
                    "Delivery order {} is already delivered",
                    order_id
                )));
            }
            DeliveryOrderStatus::Cancelled => {
                return Err(ServiceError::InvalidTransition(format!(
                    "Delivery order {} is already cancelled",
                    order_id
                )));
            }
            _ => {}
        }

        // One step at a time; delivering straight from Preparing would
        // consume stock without the order ever being en route.
        let allowed = matches!(
            (order.status, new_status),
            (DeliveryOrderStatus::Preparing, DeliveryOrderStatus::EnRoute)
                | (DeliveryOrderStatus::EnRoute, DeliveryOrderStatus::Delivered)
                | (_, DeliveryOrderStatus::Cancelled)
        );
        if !allowed {
            return Err(ServiceError::InvalidTransition(format!(
                "Delivery order {} cannot move from {} to {}",
                order_id, order.status, new_status
            )));
        }

        let old_status = order.status;
        let mut fulfilled = Vec::new();
        if new_status == DeliveryOrderStatus::Delivered {
            let lines = DeliveryOrderLineEntity::find()
                .filter(delivery_order_line::Column::DeliveryOrderId.eq(order_id))
                .all(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            for line in lines {
                let product = self
                    .stock
                    .decrease_product_stock(&txn, line.product_id, line.quantity)
                    .await?;
                fulfilled.push((product.id, line.quantity, product.stock));
            }
        }

        let mut active: delivery_order::ActiveModel = order.into();
        active.status = Set(new_status);
        if new_status == DeliveryOrderStatus::Delivered {
            active.actual_delivery_date = Set(Some(Utc::now().into()));
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("delivery_orders.status_changed", 1);
        info!(
            "Delivery order {} moved from {} to {}",
            order_id, old_status, new_status
        );

        if let Some(sender) = &self.event_sender {
            for (product_id, quantity, new_stock) in fulfilled {
                sender
                    .send_or_log(Event::StockDecreased {
                        entity: "product".to_string(),
                        entity_id: product_id,
                        quantity,
                        new_stock,
                    })
                    .await;
            }
            sender
                .send_or_log(Event::DeliveryOrderStatusChanged {
                    order_id,
                    old_status: old_status.to_string(),
                    new_status: new_status.to_string(),
                })
                .await;
            if new_status == DeliveryOrderStatus::Delivered {
                sender
                    .send_or_log(Event::DeliveryOrderDelivered { order_id })
                    .await;
            }
        }

        Ok(updated)
    }

    /// Deletes an order that has not left the warehouse. EnRoute and
    /// Delivered orders are immutable; an attached shipment also blocks
    /// deletion.
    #[instrument(skip(self))]
    pub async fn delete(&self, order_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;

        let order = DeliveryOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Delivery order {} not found", order_id))
            })?;

        if matches!(
            order.status,
            DeliveryOrderStatus::EnRoute | DeliveryOrderStatus::Delivered
        ) {
            return Err(ServiceError::ImmutableState(format!(
                "Delivery order {} is {} and cannot be deleted",
                order_id, order.status
            )));
        }

        let shipment = DeliveryEntity::find()
            .filter(
                crate::entities::delivery::Column::DeliveryOrderId.eq(order_id),
            )
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if shipment.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "Delivery order {} has a shipment attached and cannot be deleted",
                order_id
            )));
        }

        // Lines go with the order via the cascading foreign key.
        DeliveryOrderEntity::delete_by_id(order_id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    /// Sum of `quantity x unit_price` over the order's lines, recomputed on
    /// every call.
    #[instrument(skip(self))]
    pub async fn total_amount(&self, order_id: i64) -> Result<Decimal, ServiceError> {
        let db = &*self.db;

        DeliveryOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Delivery order {} not found", order_id))
            })?;

        let lines = DeliveryOrderLineEntity::find()
            .filter(delivery_order_line::Column::DeliveryOrderId.eq(order_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(lines.iter().map(|l| l.total()).sum())
    }

    pub async fn get(&self, order_id: i64) -> Result<delivery_order::Model, ServiceError> {
        let db = &*self.db;
        DeliveryOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Delivery order {} not found", order_id))
            })
    }

    pub async fn lines(
        &self,
        order_id: i64,
    ) -> Result<Vec<delivery_order_line::Model>, ServiceError> {
        let db = &*self.db;
        DeliveryOrderLineEntity::find()
            .filter(delivery_order_line::Column::DeliveryOrderId.eq(order_id))
            .order_by_asc(delivery_order_line::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<delivery_order::Model>, u64), ServiceError> {
        let db = &*self.db;
        let paginator = DeliveryOrderEntity::find()
            .order_by_asc(delivery_order::Column::Id)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page)
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn list_by_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<delivery_order::Model>, ServiceError> {
        let db = &*self.db;
        DeliveryOrderEntity::find()
            .filter(delivery_order::Column::CustomerId.eq(customer_id))
            .order_by_asc(delivery_order::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}
