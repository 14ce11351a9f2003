use crate::notify::NotificationDispatcher;
use chrono::Utc;
use std::sync::Arc;
use tavolo_cart::SessionCart;
use tavolo_core::directory::{DirectoryError, FulfillmentType, StoreDirectory};
use tavolo_core::identity::Actor;
use tavolo_core::notify::NotificationEvent;
use tavolo_delivery::{DeliveryEstimator, QuoteError};
use tavolo_order::manager::{OrderError, OrderManager, PlaceOrderRequest, Transitioned};
use tavolo_order::models::{DeliveryAddress, Order};
use tavolo_shared::models::events::{
    NewOrderEvent, OrderPlacedEvent, OrderRejectedEvent, OrderStatusChangedEvent,
};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Store not found: {0}")]
    StoreNotFound(Uuid),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Order(#[from] OrderError),
}

pub struct CheckoutRequest {
    pub customer_id: Uuid,
    pub customer_contact: Option<String>,
    pub fulfillment: FulfillmentType,
    pub delivery_address: Option<DeliveryAddress>,
    pub customer_notes: Option<String>,
}

/// The one place where cart, estimator and lifecycle manager meet.
pub struct CheckoutOrchestrator {
    directory: Arc<dyn StoreDirectory>,
    estimator: Arc<DeliveryEstimator>,
    orders: Arc<OrderManager>,
    notifications: Arc<NotificationDispatcher>,
}

impl CheckoutOrchestrator {
    pub fn new(
        directory: Arc<dyn StoreDirectory>,
        estimator: Arc<DeliveryEstimator>,
        orders: Arc<OrderManager>,
        notifications: Arc<NotificationDispatcher>,
    ) -> Self {
        Self { directory, estimator, orders, notifications }
    }

    /// Confirm a cart into a placed order: snapshot, quote, place, clear.
    /// The cart survives untouched when any step fails.
    pub async fn checkout(
        &self,
        cart: &SessionCart,
        req: CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        let snapshot = cart.snapshot().await;
        let store_id = snapshot.store_id.ok_or(CheckoutError::Order(OrderError::EmptyCart))?;
        let store = self
            .directory
            .get_store(store_id)
            .await?
            .ok_or(CheckoutError::StoreNotFound(store_id))?;

        let destination = req.delivery_address.as_ref().map(|a| a.location);
        let quote = self
            .estimator
            .quote(store.location, destination, req.fulfillment, snapshot.subtotal_cents, &store.policy)
            .await?;

        let order = self
            .orders
            .place_order(PlaceOrderRequest {
                customer_id: req.customer_id,
                customer_contact: req.customer_contact,
                store_id: store.id,
                store_owner_id: store.owner_id,
                fulfillment: req.fulfillment,
                delivery_address: req.delivery_address,
                snapshot,
                quote,
                customer_notes: req.customer_notes,
            })
            .await?;

        cart.clear().await;

        self.notifications
            .dispatch(NotificationEvent::OrderPlaced(OrderPlacedEvent {
                order_id: order.id,
                customer_id: order.customer_id,
                store_id: order.store_id,
                fulfillment: order.fulfillment.as_str().to_string(),
                total_cents: order.total_cents,
                timestamp: Utc::now().timestamp(),
            }))
            .await;
        self.notifications
            .dispatch(NotificationEvent::NewOrder(NewOrderEvent {
                order_id: order.id,
                store_id: order.store_id,
                store_owner_id: order.store_owner_id,
                item_count: order.items.len(),
                timestamp: Utc::now().timestamp(),
            }))
            .await;

        Ok(order)
    }

    pub async fn accept(&self, order_id: Uuid, actor: &Actor) -> Result<Order, CheckoutError> {
        let t = self.orders.accept(order_id, actor).await?;
        self.notify_status(&t).await;
        Ok(t.order)
    }

    pub async fn reject(
        &self,
        order_id: Uuid,
        actor: &Actor,
        reason: impl Into<String>,
    ) -> Result<Order, CheckoutError> {
        let t = self.orders.reject(order_id, actor, reason).await?;
        self.notifications
            .dispatch(NotificationEvent::OrderRejected(OrderRejectedEvent {
                order_id: t.order.id,
                customer_id: t.order.customer_id,
                store_id: t.order.store_id,
                reason: t.order.rejection_reason.clone().unwrap_or_default(),
                timestamp: Utc::now().timestamp(),
            }))
            .await;
        self.notify_status(&t).await;
        Ok(t.order)
    }

    pub async fn cancel(&self, order_id: Uuid, actor: &Actor) -> Result<Order, CheckoutError> {
        let t = self.orders.cancel(order_id, actor).await?;
        self.notify_status(&t).await;
        Ok(t.order)
    }

    pub async fn start_preparing(&self, order_id: Uuid, actor: &Actor) -> Result<Order, CheckoutError> {
        let t = self.orders.start_preparing(order_id, actor).await?;
        self.notify_status(&t).await;
        Ok(t.order)
    }

    pub async fn mark_ready(&self, order_id: Uuid, actor: &Actor) -> Result<Order, CheckoutError> {
        let t = self.orders.mark_ready(order_id, actor).await?;
        self.notify_status(&t).await;
        Ok(t.order)
    }

    pub async fn start_delivering(&self, order_id: Uuid, actor: &Actor) -> Result<Order, CheckoutError> {
        let t = self.orders.start_delivering(order_id, actor).await?;
        self.notify_status(&t).await;
        Ok(t.order)
    }

    pub async fn complete(&self, order_id: Uuid, actor: &Actor) -> Result<Order, CheckoutError> {
        let t = self.orders.complete(order_id, actor).await?;
        self.notify_status(&t).await;
        Ok(t.order)
    }

    async fn notify_status(&self, t: &Transitioned) {
        self.notifications
            .dispatch(NotificationEvent::OrderStatusChanged(OrderStatusChangedEvent {
                order_id: t.order.id,
                customer_id: t.order.customer_id,
                store_id: t.order.store_id,
                from: t.from.as_str().to_string(),
                to: t.order.status.as_str().to_string(),
                timestamp: Utc::now().timestamp(),
            }))
            .await;
    }
}
