use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tavolo_shared::models::events::{
    NewOrderEvent, OrderPlacedEvent, OrderRejectedEvent, OrderStatusChangedEvent,
};

/// Everything the platform notifies about
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEvent {
    OrderPlaced(OrderPlacedEvent),
    NewOrder(NewOrderEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    OrderRejected(OrderRejectedEvent),
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Contract for the notification dispatch collaborator.
/// Failures here must never roll back the transition that produced the event.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}
