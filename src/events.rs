use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events published after a committed engine transaction.
///
/// Events are emitted after commit, never inside the transaction: a consumer
/// must not observe an event for state that could still roll back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Receiving events
    LotReceived {
        lot_id: Uuid,
        item_id: Uuid,
        quantity: Decimal,
    },

    // Assembly events
    AssemblyCreated {
        assembly_id: Uuid,
        bom_id: Uuid,
        quantity: i32,
    },
    AssemblyReversed {
        assembly_id: Uuid,
        bom_id: Uuid,
        quantity: i32,
    },
    ComponentShortageDetected {
        bom_id: Uuid,
        component_item_id: Uuid,
        required: Decimal,
        available: Decimal,
    },

    // Fulfillment events
    DeliveryFulfilled {
        delivery_id: Uuid,
        sale_id: Uuid,
        units_delivered: usize,
    },
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::LotReceived { .. } => "lot.received",
            Event::AssemblyCreated { .. } => "assembly.created",
            Event::AssemblyReversed { .. } => "assembly.reversed",
            Event::ComponentShortageDetected { .. } => "assembly.component_shortage",
            Event::DeliveryFulfilled { .. } => "delivery.fulfilled",
        }
    }
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

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Engine commits must not be failed retroactively by a slow consumer.
    pub async fn send_or_log(&self, event: Event) {
        let event_type = event.event_type();
        if let Err(e) = self.send(event).await {
            warn!(event_type, "Dropping event: {}", e);
        }
    }
}

/// Consumes the event channel and logs each event. Runs for the lifetime of
/// the process; exits when every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!(event_type = event.event_type(), "Event: {:?}", event);
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn send_or_log_does_not_error_on_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let sender = EventSender::new(tx);
        // Must not panic or return an error path to the caller.
        sender
            .send_or_log(Event::LotReceived {
                lot_id: Uuid::new_v4(),
                item_id: Uuid::new_v4(),
                quantity: dec!(8),
            })
            .await;
    }
}
