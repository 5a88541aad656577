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
        raw_material::Entity as RawMaterialEntity,
        supplier::Entity as SupplierEntity,
        supply_order::{self, Entity as SupplyOrderEntity, SupplyOrderStatus},
        supply_order_line::{self, Entity as SupplyOrderLineEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock::StockService,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SupplyOrderLineInput {
    pub raw_material_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i64,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSupplyOrderInput {
    #[validate(length(min = 1, max = 64))]
    pub order_number: String,
    pub supplier_id: i64,
    pub expected_delivery_date: Option<chrono::DateTime<chrono::FixedOffset>>,
    #[validate]
    pub lines: Vec<SupplyOrderLineInput>,
}

/// Replenishment orders placed with a supplier.
///
/// Pending -> InProgress -> Received, with Cancelled reachable from the two
/// non-terminal states. Received is final; a Cancelled order can only be
/// reactivated back to Pending. Receiving is the only operation that touches
/// stock: every line's quantity lands on its raw material in one transaction.
#[derive(Clone)]
pub struct SupplyOrderService {
    db: Arc<DatabaseConnection>,
    stock: StockService,
    event_sender: Option<EventSender>,
}

impl SupplyOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self {
            stock: StockService::new(db.clone()),
            db,
            event_sender,
        }
    }

    /// Creates the order with its lines in one transaction. An order always
    /// carries at least one line; no stock check applies here.
    #[instrument(skip(self, input), fields(order_number = %input.order_number))]
    pub async fn create(
        &self,
        input: CreateSupplyOrderInput,
    ) -> Result<supply_order::Model, ServiceError> {
        input.validate()?;
        if input.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "Supply order must have at least one line".to_string(),
            ));
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let duplicate = SupplyOrderEntity::find()
            .filter(supply_order::Column::OrderNumber.eq(input.order_number.clone()))
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::DuplicateResource(format!(
                "Supply order number {} already exists",
                input.order_number
            )));
        }

        SupplierEntity::find_by_id(input.supplier_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", input.supplier_id))
            })?;

        for line in &input.lines {
            RawMaterialEntity::find_by_id(line.raw_material_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Raw material {} not found",
                        line.raw_material_id
                    ))
                })?;
        }

        let order = supply_order::ActiveModel {
            order_number: Set(input.order_number),
            supplier_id: Set(input.supplier_id),
            status: Set(SupplyOrderStatus::Pending),
            expected_delivery_date: Set(input.expected_delivery_date),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let created = order.insert(&txn).await.map_err(|e| {
            error!("Failed to create supply order: {}", e);
            ServiceError::db_error(e)
        })?;

        for line in &input.lines {
            let row = supply_order_line::ActiveModel {
                supply_order_id: Set(created.id),
                raw_material_id: Set(line.raw_material_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                created_at: Set(Utc::now().into()),
                updated_at: Set(Utc::now().into()),
                ..Default::default()
            };
            row.insert(&txn).await.map_err(ServiceError::db_error)?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("supply_orders.created", 1);
        info!(
            "Supply order created: id={}, supplier_id={}, lines={}",
            created.id,
            created.supplier_id,
            input.lines.len()
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::SupplyOrderCreated {
                    order_id: created.id,
                    supplier_id: created.supplier_id,
                })
                .await;
        }

        Ok(created)
    }

    /// Explicit transition table. Received is immutable; Cancelled only
    /// reactivates to Pending; Pending must pass through InProgress before
    /// Received. Transitioning to Received runs the full receive flow.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: i64,
        new_status: SupplyOrderStatus,
    ) -> Result<supply_order::Model, ServiceError> {
        let db = &*self.db;

        let order = SupplyOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supply order {} not found", order_id))
            })?;

        let allowed = match (order.status, new_status) {
            (SupplyOrderStatus::Pending, SupplyOrderStatus::InProgress) => true,
            (SupplyOrderStatus::Pending, SupplyOrderStatus::Cancelled) => true,
            (SupplyOrderStatus::InProgress, SupplyOrderStatus::Received) => true,
            (SupplyOrderStatus::InProgress, SupplyOrderStatus::Cancelled) => true,
            (SupplyOrderStatus::Cancelled, SupplyOrderStatus::Pending) => true,
            _ => false,
        };

        if !allowed {
            let reason = match order.status {
                SupplyOrderStatus::Received => {
                    format!("Supply order {} is already received", order_id)
                }
                SupplyOrderStatus::Cancelled => format!(
                    "Supply order {} is cancelled and can only be reactivated to Pending",
                    order_id
                ),
                SupplyOrderStatus::Pending if new_status == SupplyOrderStatus::Received => {
                    format!(
                        "Supply order {} must pass through InProgress before Received",
                        order_id
                    )
                }
                _ => format!(
                    "Supply order {} cannot move from {} to {}",
                    order_id, order.status, new_status
                ),
            };
            return Err(ServiceError::InvalidTransition(reason));
        }

        if new_status == SupplyOrderStatus::Received {
            // Single code path for stock arrival.
            return self.receive(order_id).await;
        }

        let old_status = order.status;
        let mut active: supply_order::ActiveModel = order.into();
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(
            "Supply order {} moved from {} to {}",
            order_id, old_status, new_status
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::SupplyOrderStatusChanged {
                    order_id,
                    old_status: old_status.to_string(),
                    new_status: new_status.to_string(),
                })
                .await;
        }

        Ok(updated)
    }

    /// Books an InProgress order into stock: every line's quantity is added
    /// to its raw material and the order becomes Received, all in one
    /// transaction.
    #[instrument(skip(self))]
    pub async fn receive(&self, order_id: i64) -> Result<supply_order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let order = SupplyOrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supply order {} not found", order_id))
            })?;

        if order.status != SupplyOrderStatus::InProgress {
            return Err(ServiceError::InvalidTransition(format!(
                "Supply order {} is {}, only InProgress orders can be received",
                order_id, order.status
            )));
        }

        let lines = SupplyOrderLineEntity::find()
            .filter(supply_order_line::Column::SupplyOrderId.eq(order_id))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let mut received = Vec::with_capacity(lines.len());
        for line in &lines {
            let material = self
                .stock
                .increase_material_stock(&txn, line.raw_material_id, line.quantity)
                .await?;
            received.push((material.id, line.quantity, material.stock));
        }

        let mut active: supply_order::ActiveModel = order.into();
        active.status = Set(SupplyOrderStatus::Received);
        active.actual_delivery_date = Set(Some(Utc::now().into()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("supply_orders.received", 1);
        info!(
            "Supply order received: id={}, lines={}",
            order_id,
            lines.len()
        );

        if let Some(sender) = &self.event_sender {
            for (raw_material_id, quantity, new_stock) in received {
                sender
                    .send_or_log(Event::StockIncreased {
                        entity: "raw_material".to_string(),
                        entity_id: raw_material_id,
                        quantity,
                        new_stock,
                    })
                    .await;
            }
            sender
                .send_or_log(Event::SupplyOrderReceived {
                    order_id,
                    line_count: lines.len(),
                })
                .await;
        }

        Ok(updated)
    }

    /// Cancels a Pending or InProgress order. Received orders are final.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: i64) -> Result<supply_order::Model, ServiceError> {
        self.update_status(order_id, SupplyOrderStatus::Cancelled)
            .await
    }

    /// Deletes an order that never arrived. Received orders are kept for the
    /// stock audit trail.
    #[instrument(skip(self))]
    pub async fn delete(&self, order_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;

        let order = SupplyOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supply order {} not found", order_id))
            })?;

        if order.status == SupplyOrderStatus::Received {
            return Err(ServiceError::ImmutableState(format!(
                "Supply order {} is received and cannot be deleted",
                order_id
            )));
        }

        SupplyOrderEntity::delete_by_id(order_id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    /// Adds a line to a live order.
    #[instrument(skip(self))]
    pub async fn add_line(
        &self,
        order_id: i64,
        input: SupplyOrderLineInput,
    ) -> Result<supply_order_line::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let order = SupplyOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supply order {} not found", order_id))
            })?;

        if order.status.is_terminal() {
            return Err(ServiceError::ImmutableState(format!(
                "Supply order {} is {} and its lines cannot change",
                order_id, order.status
            )));
        }

        RawMaterialEntity::find_by_id(input.raw_material_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Raw material {} not found",
                    input.raw_material_id
                ))
            })?;

        let row = supply_order_line::ActiveModel {
            supply_order_id: Set(order_id),
            raw_material_id: Set(input.raw_material_id),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        row.insert(db).await.map_err(ServiceError::db_error)
    }

    /// Changes quantity or price of a line on a live order.
    #[instrument(skip(self))]
    pub async fn update_line(
        &self,
        line_id: i64,
        quantity: Option<i64>,
        unit_price: Option<Decimal>,
    ) -> Result<supply_order_line::Model, ServiceError> {
        let db = &*self.db;

        if let Some(quantity) = quantity {
            if quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Line quantity must be positive, got {}",
                    quantity
                )));
            }
        }

        let line = SupplyOrderLineEntity::find_by_id(line_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supply order line {} not found", line_id))
            })?;

        self.require_live_order(line.supply_order_id).await?;

        let mut active: supply_order_line::ActiveModel = line.into();
        if let Some(quantity) = quantity {
            active.quantity = Set(quantity);
        }
        if let Some(unit_price) = unit_price {
            active.unit_price = Set(unit_price);
        }
        active.updated_at = Set(Utc::now().into());
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Removes a line from a live order. The last line cannot be removed;
    /// delete the order instead.
    #[instrument(skip(self))]
    pub async fn remove_line(&self, line_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;

        let line = SupplyOrderLineEntity::find_by_id(line_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supply order line {} not found", line_id))
            })?;

        self.require_live_order(line.supply_order_id).await?;

        let remaining = SupplyOrderLineEntity::find()
            .filter(supply_order_line::Column::SupplyOrderId.eq(line.supply_order_id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if remaining <= 1 {
            return Err(ServiceError::ValidationError(format!(
                "Cannot delete the last line of supply order {}; delete the order instead",
                line.supply_order_id
            )));
        }

        SupplyOrderLineEntity::delete_by_id(line_id)
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

        SupplyOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supply order {} not found", order_id))
            })?;

        let lines = SupplyOrderLineEntity::find()
            .filter(supply_order_line::Column::SupplyOrderId.eq(order_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(lines.iter().map(|l| l.total()).sum())
    }

    pub async fn get(&self, order_id: i64) -> Result<supply_order::Model, ServiceError> {
        let db = &*self.db;
        SupplyOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Supply order {} not found", order_id)))
    }

    pub async fn lines(
        &self,
        order_id: i64,
    ) -> Result<Vec<supply_order_line::Model>, ServiceError> {
        let db = &*self.db;
        SupplyOrderLineEntity::find()
            .filter(supply_order_line::Column::SupplyOrderId.eq(order_id))
            .order_by_asc(supply_order_line::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<supply_order::Model>, u64), ServiceError> {
        let db = &*self.db;
        let paginator = SupplyOrderEntity::find()
            .order_by_asc(supply_order::Column::Id)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page)
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn list_by_supplier(
        &self,
        supplier_id: i64,
    ) -> Result<Vec<supply_order::Model>, ServiceError> {
        let db = &*self.db;
        SupplyOrderEntity::find()
            .filter(supply_order::Column::SupplierId.eq(supplier_id))
            .order_by_asc(supply_order::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }

    async fn require_live_order(&self, order_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;
        let order = SupplyOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supply order {} not found", order_id))
            })?;
        if order.status.is_terminal() {
            return Err(ServiceError::ImmutableState(format!(
                "Supply order {} is {} and its lines cannot change",
                order_id, order.status
            )));
        }
        Ok(())
    }
}
