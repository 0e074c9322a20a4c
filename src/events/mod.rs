use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sender plus the receiving end for `process_events`
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))
    }

    /// Sends without failing the caller; a closed channel is only logged
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "domain event dropped");
        }
    }
}

// Domain events raised by the purchasing, items, sales, scheduling and people
// workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Purchase order events
    PurchaseOrderReleased {
        purchase_order_id: Uuid,
        company_id: Uuid,
        released_by: Uuid,
        document_path: Option<String>,
    },
    PurchaseOrderUpdated(Uuid),
    PurchaseOrderDeliveryUpdated(Uuid),
    PurchaseOrderPaymentUpdated(Uuid),
    PurchaseOrderEmailQueued {
        purchase_order_id: Uuid,
        task_id: Uuid,
    },

    // Notes
    NotesUpdated {
        table: String,
        id: Uuid,
        scope: String,
    },

    // Scheduling
    ScheduleReordered {
        column_id: Uuid,
        items: usize,
    },

    // Saved views
    SavedViewCreated(Uuid),
    SavedViewsReordered {
        user_id: Uuid,
        group_key: String,
    },
    SavedViewDeleted(Uuid),

    // Suppliers
    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),

    // Items
    ItemPostingGroupUpdated(Uuid),
    ItemCostUpdated(Uuid),

    // Sales
    SalesRfqLineCreated {
        sales_rfq_id: Uuid,
        line_id: Uuid,
    },

    // Users
    UserDeactivated(Uuid),
    InviteResent {
        user_id: Uuid,
        invite_id: Uuid,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::PurchaseOrderReleased { .. } => "purchase_order.released",
            Event::PurchaseOrderUpdated(_) => "purchase_order.updated",
            Event::PurchaseOrderDeliveryUpdated(_) => "purchase_order.delivery_updated",
            Event::PurchaseOrderPaymentUpdated(_) => "purchase_order.payment_updated",
            Event::PurchaseOrderEmailQueued { .. } => "purchase_order.email_queued",
            Event::NotesUpdated { .. } => "notes.updated",
            Event::ScheduleReordered { .. } => "schedule.reordered",
            Event::SavedViewCreated(_) => "saved_view.created",
            Event::SavedViewsReordered { .. } => "saved_view.reordered",
            Event::SavedViewDeleted(_) => "saved_view.deleted",
            Event::SupplierCreated(_) => "supplier.created",
            Event::SupplierUpdated(_) => "supplier.updated",
            Event::ItemPostingGroupUpdated(_) => "item.posting_group_updated",
            Event::ItemCostUpdated(_) => "item.cost_updated",
            Event::SalesRfqLineCreated { .. } => "sales_rfq.line_created",
            Event::UserDeactivated(_) => "user.deactivated",
            Event::InviteResent { .. } => "user.invite_resent",
        }
    }
}

/// Drains the event channel until every sender is dropped
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::PurchaseOrderReleased {
                purchase_order_id,
                document_path,
                ..
            } => {
                info!(
                    event = event.name(),
                    %purchase_order_id,
                    document = document_path.as_deref().unwrap_or("none"),
                    "purchase order released"
                );
            }
            other => debug!(event = other.name(), payload = ?other, "domain event"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_reach_the_receiver() {
        let (sender, mut rx) = EventSender::channel(4);
        let id = Uuid::new_v4();
        sender.send(Event::SupplierCreated(id)).await.unwrap();
        assert_eq!(rx.recv().await, Some(Event::SupplierCreated(id)));
    }

    #[tokio::test]
    async fn closed_channel_is_an_event_error() {
        let (sender, rx) = EventSender::channel(1);
        drop(rx);
        let err = sender
            .send(Event::UserDeactivated(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "event");
    }

    #[test]
    fn event_names_are_area_dot_action() {
        let id = Uuid::new_v4();
        let events = [
            Event::PurchaseOrderUpdated(id),
            Event::SavedViewDeleted(id),
            Event::ItemCostUpdated(id),
            Event::SalesRfqLineCreated {
                sales_rfq_id: id,
                line_id: id,
            },
        ];
        for event in events {
            let (area, action) = event.name().split_once('.').unwrap();
            assert!(!area.is_empty() && !action.is_empty(), "{}", event.name());
        }
    }
}
