use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the order and payment services.
///
/// Emission is best-effort and never on a request's critical path; a failed
/// send is logged and the request continues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderDeleted(Uuid),
    PaymentInitiated {
        payment_id: Uuid,
        order_id: Uuid,
        amount: Decimal,
    },
    PaymentFailed {
        payment_id: Uuid,
        order_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is gone
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event delivery failed: {}", e);
        }
    }
}

/// Consumes events from the channel and records them.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    order_id = %order_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Order status changed"
                );
            }
            Event::OrderDeleted(order_id) => {
                info!(order_id = %order_id, "Order deleted");
            }
            Event::PaymentInitiated {
                payment_id,
                order_id,
                amount,
            } => {
                info!(
                    payment_id = %payment_id,
                    order_id = %order_id,
                    amount = %amount,
                    "Payment initiated"
                );
            }
            Event::PaymentFailed {
                payment_id,
                order_id,
            } => {
                info!(payment_id = %payment_id, order_id = %order_id, "Payment failed");
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}
