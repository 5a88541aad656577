use chrono::Utc;
use metrics::counter;
use rust_decimal::prelude::ToPrimitive;
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
        production_order::{self, Entity as ProductionOrderEntity, ProductionOrderStatus},
        product::Entity as ProductEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{bom::BomService, stock::StockService},
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductionOrderInput {
    #[validate(length(min = 1, max = 64))]
    pub order_number: String,
    pub product_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductionOrderInput {
    #[validate(length(min = 1, max = 64))]
    pub order_number: Option<String>,
    pub product_id: Option<i64>,
    #[validate(range(min = 1))]
    pub quantity: Option<i64>,
}

/// Production order lifecycle: Pending -> InProduction -> Completed, with
/// Cancelled reachable from any non-terminal state.
///
/// Materials are checked when production starts and consumed when it
/// completes; nothing is reserved in between, and cancellation reverses
/// nothing. Creation deliberately skips the material check so orders can be
/// queued ahead of replenishment.
#[derive(Clone)]
pub struct ProductionOrderService {
    db: Arc<DatabaseConnection>,
    stock: StockService,
    bom: BomService,
    event_sender: Option<EventSender>,
}

impl ProductionOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self {
            stock: StockService::new(db.clone()),
            bom: BomService::new(db.clone()),
            db,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        input: CreateProductionOrderInput,
    ) -> Result<production_order::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let duplicate = ProductionOrderEntity::find()
            .filter(production_order::Column::OrderNumber.eq(input.order_number.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::DuplicateResource(format!(
                "Production order number {} already exists",
                input.order_number
            )));
        }

        ProductEntity::find_by_id(input.product_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let order = production_order::ActiveModel {
            order_number: Set(input.order_number),
            product_id: Set(input.product_id),
            quantity: Set(input.quantity),
            status: Set(ProductionOrderStatus::Pending),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let created = order.insert(db).await.map_err(|e| {
            error!("Failed to create production order: {}", e);
            ServiceError::db_error(e)
        })?;

        counter!("production_orders.created", 1);
        info!(
            "Production order created: id={}, order_number={}, product_id={}, quantity={}",
            created.id, created.order_number, created.product_id, created.quantity
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ProductionOrderCreated {
                    order_id: created.id,
                    product_id: created.product_id,
                    quantity: created.quantity,
                })
                .await;
        }

        Ok(created)
    }

    /// Moves a Pending order into production after verifying that current
    /// material stock covers the full quantity. Stock is not touched here.
    #[instrument(skip(self))]
    pub async fn start(&self, order_id: i64) -> Result<production_order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let order = ProductionOrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production order {} not found", order_id))
            })?;

        if order.status != ProductionOrderStatus::Pending {
            return Err(ServiceError::InvalidTransition(format!(
                "Production order {} is {}, only Pending orders can be started",
                order_id, order.status
            )));
        }

        let availability = self
            .bom
            .check_availability(&txn, order.product_id, order.quantity)
            .await?;
        if !availability.can_produce {
            if let Some(sender) = &self.event_sender {
                for shortage in &availability.shortages {
                    sender
                        .send_or_log(Event::MaterialShortageDetected {
                            order_id,
                            raw_material_id: shortage.raw_material_id,
                            required: shortage.required,
                            available: shortage.available,
                        })
                        .await;
                }
            }
            return Err(Self::shortage_error(order_id, &availability.shortages));
        }

        let mut active: production_order::ActiveModel = order.into();
        active.status = Set(ProductionOrderStatus::InProduction);
        active.start_date = Set(Some(Utc::now().into()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("production_orders.started", 1);
        info!("Production order started: id={}", updated.id);

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ProductionOrderStarted {
                    order_id: updated.id,
                    product_id: updated.product_id,
                })
                .await;
        }

        Ok(updated)
    }

    /// Finishes an InProduction order: consumes materials (rounded up per
    /// recipe line), adds the produced quantity to product stock, and stamps
    /// the end date. Runs in one transaction; any shortage rolls back all of
    /// it.
    #[instrument(skip(self))]
    pub async fn complete(&self, order_id: i64) -> Result<production_order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let order = ProductionOrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production order {} not found", order_id))
            })?;

        if order.status != ProductionOrderStatus::InProduction {
            return Err(ServiceError::InvalidTransition(format!(
                "Production order {} is {}, only InProduction orders can be completed",
                order_id, order.status
            )));
        }

        // Stock may have moved since start; check again before consuming.
        let availability = self
            .bom
            .check_availability(&txn, order.product_id, order.quantity)
            .await?;
        if !availability.can_produce {
            return Err(Self::shortage_error(order_id, &availability.shortages));
        }

        let requirements = self
            .bom
            .required_materials(&txn, order.product_id, order.quantity)
            .await?;

        let mut consumed = Vec::with_capacity(requirements.len());
        for req in &requirements {
            // Whole units leave the shelf: round each line up independently.
            let units = req.required.ceil().to_i64().ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Material requirement {} for raw material {} does not fit in i64",
                    req.required, req.raw_material_id
                ))
            })?;
            if units > 0 {
                let material = self
                    .stock
                    .decrease_material_stock(&txn, req.raw_material_id, units)
                    .await?;
                consumed.push((material.id, units, material.stock));
            }
        }

        let product = self
            .stock
            .increase_product_stock(&txn, order.product_id, order.quantity)
            .await?;

        let mut active: production_order::ActiveModel = order.into();
        active.status = Set(ProductionOrderStatus::Completed);
        active.end_date = Set(Some(Utc::now().into()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("production_orders.completed", 1);
        info!(
            "Production order completed: id={}, product_id={}, quantity={}",
            updated.id, updated.product_id, updated.quantity
        );

        if let Some(sender) = &self.event_sender {
            for (raw_material_id, units, new_stock) in consumed {
                sender
                    .send_or_log(Event::StockDecreased {
                        entity: "raw_material".to_string(),
                        entity_id: raw_material_id,
                        quantity: units,
                        new_stock,
                    })
                    .await;
            }
            sender
                .send_or_log(Event::StockIncreased {
                    entity: "product".to_string(),
                    entity_id: product.id,
                    quantity: updated.quantity,
                    new_stock: product.stock,
                })
                .await;
            sender
                .send_or_log(Event::ProductionOrderCompleted {
                    order_id: updated.id,
                    product_id: updated.product_id,
                    quantity: updated.quantity,
                })
                .await;
        }

        Ok(updated)
    }

    /// Cancels any non-terminal order. No stock is reversed because nothing
    /// was consumed or reserved before completion.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: i64) -> Result<production_order::Model, ServiceError> {
        let db = &*self.db;

        let order = ProductionOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production order {} not found", order_id))
            })?;

        if order.status.is_terminal() {
            return Err(ServiceError::ImmutableState(format!(
                "Production order {} is already {}",
                order_id, order.status
            )));
        }

        let mut active: production_order::ActiveModel = order.into();
        active.status = Set(ProductionOrderStatus::Cancelled);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        counter!("production_orders.cancelled", 1);
        info!("Production order cancelled: id={}", updated.id);

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ProductionOrderCancelled { order_id: updated.id })
                .await;
        }

        Ok(updated)
    }

    /// Rewrites header fields while the order has not entered a terminal
    /// state. Completed and Cancelled orders are immutable.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        order_id: i64,
        input: UpdateProductionOrderInput,
    ) -> Result<production_order::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let order = ProductionOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production order {} not found", order_id))
            })?;

        if order.status.is_terminal() {
            return Err(ServiceError::ImmutableState(format!(
                "Production order {} is {} and cannot be updated",
                order_id, order.status
            )));
        }

        if let Some(order_number) = &input.order_number {
            let clash = ProductionOrderEntity::find()
                .filter(production_order::Column::OrderNumber.eq(order_number.clone()))
                .filter(production_order::Column::Id.ne(order_id))
                .one(db)
                .await
                .map_err(ServiceError::db_error)?;
            if clash.is_some() {
                return Err(ServiceError::DuplicateResource(format!(
                    "Production order number {} already exists",
                    order_number
                )));
            }
        }

        if let Some(product_id) = input.product_id {
            ProductEntity::find_by_id(product_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", product_id))
                })?;
        }

        let mut active: production_order::ActiveModel = order.into();
        if let Some(order_number) = input.order_number {
            active.order_number = Set(order_number);
        }
        if let Some(product_id) = input.product_id {
            active.product_id = Set(product_id);
        }
        if let Some(quantity) = input.quantity {
            active.quantity = Set(quantity);
        }
        active.updated_at = Set(Utc::now().into());
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Deletes an order that never ran: Pending or Cancelled only.
    #[instrument(skip(self))]
    pub async fn delete(&self, order_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;

        let order = ProductionOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production order {} not found", order_id))
            })?;

        if !matches!(
            order.status,
            ProductionOrderStatus::Pending | ProductionOrderStatus::Cancelled
        ) {
            return Err(ServiceError::InvalidTransition(format!(
                "Production order {} is {} and cannot be deleted",
                order_id, order.status
            )));
        }

        ProductionOrderEntity::delete_by_id(order_id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    pub async fn get(&self, order_id: i64) -> Result<production_order::Model, ServiceError> {
        let db = &*self.db;
        ProductionOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production order {} not found", order_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<production_order::Model>, u64), ServiceError> {
        let db = &*self.db;
        let paginator = ProductionOrderEntity::find()
            .order_by_asc(production_order::Column::Id)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page)
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn list_by_status(
        &self,
        status: ProductionOrderStatus,
    ) -> Result<Vec<production_order::Model>, ServiceError> {
        let db = &*self.db;
        ProductionOrderEntity::find()
            .filter(production_order::Column::Status.eq(status))
            .order_by_asc(production_order::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }

    fn shortage_error(
        order_id: i64,
        shortages: &[crate::services::bom::MaterialShortage],
    ) -> ServiceError {
        let detail = shortages
            .iter()
            .map(|s| format!("{}: need {}, have {}", s.code, s.required, s.available))
            .collect::<Vec<_>>()
            .join("; ");
        ServiceError::InsufficientStock(format!(
            "Production order {} lacks materials ({})",
            order_id, detail
        ))
    }
}
