use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Domain events emitted by the service layer after a transaction commits.
///
/// Delivery is best-effort: an event that fails to enqueue is logged and
/// dropped, never rolled back into the originating operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Production order events
    ProductionOrderCreated {
        order_id: i64,
        product_id: i64,
        quantity: i64,
    },
    ProductionOrderStarted {
        order_id: i64,
        product_id: i64,
    },
    ProductionOrderCompleted {
        order_id: i64,
        product_id: i64,
        quantity: i64,
    },
    ProductionOrderCancelled {
        order_id: i64,
    },

    // Delivery order events
    DeliveryOrderCreated {
        order_id: i64,
        customer_id: i64,
    },
    DeliveryOrderStatusChanged {
        order_id: i64,
        old_status: String,
        new_status: String,
    },
    DeliveryOrderDelivered {
        order_id: i64,
    },

    // Shipment events
    DeliveryCreated {
        delivery_id: i64,
        delivery_order_id: i64,
    },
    DeliveryDelivered {
        delivery_id: i64,
    },

    // Supply order events
    SupplyOrderCreated {
        order_id: i64,
        supplier_id: i64,
    },
    SupplyOrderStatusChanged {
        order_id: i64,
        old_status: String,
        new_status: String,
    },
    SupplyOrderReceived {
        order_id: i64,
        line_count: usize,
    },

    // Stock events
    StockIncreased {
        entity: String,
        entity_id: i64,
        quantity: i64,
        new_stock: i64,
    },
    StockDecreased {
        entity: String,
        entity_id: i64,
        quantity: i64,
        new_stock: i64,
    },
    MaterialShortageDetected {
        order_id: i64,
        raw_material_id: i64,
        required: Decimal,
        available: i64,
    },
}

/// Cloneable handle for emitting events into the processing loop.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing the failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// State-machine operations use this form: the mutation has already
    /// committed and must not be reported as failed because of the event bus.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping domain event: {}", e);
        }
    }
}

/// Creates a bounded event channel with its sender handle.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Consumes events until every sender is dropped. External integrations
/// (audit trail, alerting, webhooks) subscribe here; the core only logs.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::MaterialShortageDetected {
                order_id,
                raw_material_id,
                required,
                available,
            } => {
                warn!(
                    order_id,
                    raw_material_id,
                    %required,
                    available,
                    "Material shortage detected"
                );
            }
            other => {
                info!("Domain event: {:?}", other);
            }
        }
    }

    info!("Event processing loop stopped");
}
