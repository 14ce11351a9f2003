use crate::authz::{self, TransitionEvent};
use crate::models::{DeliveryAddress, Order, OrderItem, OrderStatus};
use crate::repository::{OrderRepository, RepositoryError};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tavolo_cart::CartSnapshot;
use tavolo_core::directory::FulfillmentType;
use tavolo_core::identity::{Actor, Role};
use tavolo_delivery::DeliveryQuote;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid transition from {from:?} via {event:?}")]
    InvalidTransition { from: OrderStatus, event: TransitionEvent },

    #[error("{role:?} {actor_id} is not permitted to {event:?} order {order_id}")]
    Unauthorized {
        actor_id: Uuid,
        role: Role,
        event: TransitionEvent,
        order_id: Uuid,
    },

    #[error("Order {0} is closed")]
    Closed(Uuid),

    #[error("Cannot place an order from an empty cart")]
    EmptyCart,

    #[error("Delivery orders require a delivery address")]
    MissingAddress,

    #[error("Rejection requires a reason")]
    MissingRejectionReason,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct PlaceOrderRequest {
    pub customer_id: Uuid,
    pub customer_contact: Option<String>,
    pub store_id: Uuid,
    pub store_owner_id: Uuid,
    pub fulfillment: FulfillmentType,
    pub delivery_address: Option<DeliveryAddress>,
    pub snapshot: CartSnapshot,
    pub quote: DeliveryQuote,
    pub customer_notes: Option<String>,
}

/// A successful transition: the order afterwards, plus where it came from
#[derive(Debug, Clone)]
pub struct Transitioned {
    pub order: Order,
    pub from: OrderStatus,
}

/// Owns every open order and serializes mutations per order: each entry sits
/// behind its own lock, so two racing transitions resolve to whoever acquires
/// it first and the loser fails the status guard.
pub struct OrderManager {
    orders: RwLock<HashMap<Uuid, Arc<Mutex<Order>>>>,
    repo: Arc<dyn OrderRepository>,
    ping_seq: AtomicU64,
}

impl OrderManager {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            repo,
            ping_seq: AtomicU64::new(0),
        }
    }

    /// Create the order aggregate from a confirmed cart snapshot and a quote.
    /// Items are frozen here; totals are recomputed, never taken from input.
    pub async fn place_order(&self, req: PlaceOrderRequest) -> Result<Order, OrderError> {
        if req.snapshot.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        if req.fulfillment == FulfillmentType::Delivery && req.delivery_address.is_none() {
            return Err(OrderError::MissingAddress);
        }
        debug_assert_eq!(req.quote.fulfillment, req.fulfillment);

        let items: Vec<OrderItem> = req.snapshot.lines.iter().map(OrderItem::from_cart_line).collect();
        let order = Order::new_placed(
            req.customer_id,
            req.customer_contact,
            req.store_id,
            req.store_owner_id,
            req.fulfillment,
            req.delivery_address,
            items,
            req.quote.fee_cents,
            req.customer_notes,
        );

        self.repo.create(&order).await?;
        self.orders
            .write()
            .await
            .insert(order.id, Arc::new(Mutex::new(order.clone())));

        tracing::info!(
            order_id = %order.id,
            store_id = %order.store_id,
            total_cents = order.total_cents,
            fulfillment = order.fulfillment.as_str(),
            "order placed"
        );
        Ok(order)
    }

    /// Transition: PLACED -> ACCEPTED (store owner)
    pub async fn accept(&self, order_id: Uuid, actor: &Actor) -> Result<Transitioned, OrderError> {
        self.apply(order_id, actor, TransitionEvent::Accept, None).await
    }

    /// Transition: PLACED -> REJECTED (store owner, reason required)
    pub async fn reject(
        &self,
        order_id: Uuid,
        actor: &Actor,
        reason: impl Into<String>,
    ) -> Result<Transitioned, OrderError> {
        let reason = reason.into().trim().to_string();
        if reason.is_empty() {
            return Err(OrderError::MissingRejectionReason);
        }
        self.apply(order_id, actor, TransitionEvent::Reject, Some(reason)).await
    }

    /// Transition: PLACED/ACCEPTED -> CANCELLED (customer or store owner)
    pub async fn cancel(&self, order_id: Uuid, actor: &Actor) -> Result<Transitioned, OrderError> {
        self.apply(order_id, actor, TransitionEvent::Cancel, None).await
    }

    /// Transition: ACCEPTED -> PREPARING (store owner)
    pub async fn start_preparing(&self, order_id: Uuid, actor: &Actor) -> Result<Transitioned, OrderError> {
        self.apply(order_id, actor, TransitionEvent::StartPreparing, None).await
    }

    /// Transition: PREPARING -> READY (store owner)
    pub async fn mark_ready(&self, order_id: Uuid, actor: &Actor) -> Result<Transitioned, OrderError> {
        self.apply(order_id, actor, TransitionEvent::MarkReady, None).await
    }

    /// Transition: READY -> DELIVERING (delivery orders; store owner or driver).
    /// A driver starting the delivery becomes the order's assigned driver.
    pub async fn start_delivering(&self, order_id: Uuid, actor: &Actor) -> Result<Transitioned, OrderError> {
        self.apply(order_id, actor, TransitionEvent::StartDelivering, None).await
    }

    /// Transition: READY -> COMPLETED for pickup, DELIVERING -> COMPLETED for delivery
    pub async fn complete(&self, order_id: Uuid, actor: &Actor) -> Result<Transitioned, OrderError> {
        self.apply(order_id, actor, TransitionEvent::Complete, None).await
    }

    pub async fn get(&self, order_id: Uuid) -> Result<Order, OrderError> {
        let entry = self.entry(order_id).await?;
        let order = entry.lock().await;
        Ok(order.clone())
    }

    pub async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, OrderError> {
        Ok(self.repo.list_for_customer(customer_id).await?)
    }

    pub async fn list_for_store(&self, store_id: Uuid) -> Result<Vec<Order>, OrderError> {
        Ok(self.repo.list_for_store(store_id).await?)
    }

    pub(crate) async fn entry(&self, order_id: Uuid) -> Result<Arc<Mutex<Order>>, OrderError> {
        self.orders
            .read()
            .await
            .get(&order_id)
            .cloned()
            .ok_or(OrderError::NotFound(order_id))
    }

    pub(crate) fn next_ping_seq(&self) -> u64 {
        self.ping_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) async fn persist(&self, order: &Order) -> Result<(), OrderError> {
        Ok(self.repo.save(order).await?)
    }

    async fn apply(
        &self,
        order_id: Uuid,
        actor: &Actor,
        event: TransitionEvent,
        reason: Option<String>,
    ) -> Result<Transitioned, OrderError> {
        let entry = self.entry(order_id).await?;
        let mut order = entry.lock().await;

        let relationship = authz::is_permitted(event, actor, &order).ok_or(OrderError::Unauthorized {
            actor_id: actor.id,
            role: actor.role,
            event,
            order_id,
        })?;

        let from = order.status;
        let target = Self::guard(&order, event)?;

        match event {
            TransitionEvent::Reject => {
                order.rejection_reason = reason;
            }
            TransitionEvent::StartDelivering
                if relationship == authz::Relationship::UnassignedDriver =>
            {
                order.assigned_driver_id = Some(actor.id);
            }
            _ => {}
        }

        if !order.set_status(target, Utc::now()) {
            // status timestamp already set: a duplicate of an earlier transition
            return Err(OrderError::InvalidTransition { from, event });
        }
        order.recompute_totals();

        self.repo.save(&order).await?;
        tracing::info!(
            order_id = %order.id,
            from = from.as_str(),
            to = order.status.as_str(),
            "order transitioned"
        );
        Ok(Transitioned { order: order.clone(), from })
    }

    /// The transition table. Anything not listed is an invalid transition,
    /// including every event against a terminal status.
    fn guard(order: &Order, event: TransitionEvent) -> Result<OrderStatus, OrderError> {
        use OrderStatus::*;
        let target = match (event, order.status) {
            (TransitionEvent::Accept, Placed) => Accepted,
            (TransitionEvent::Reject, Placed) => Rejected,
            (TransitionEvent::Cancel, Placed | Accepted) => Cancelled,
            (TransitionEvent::StartPreparing, Accepted) => Preparing,
            (TransitionEvent::MarkReady, Preparing) => Ready,
            (TransitionEvent::StartDelivering, Ready)
                if order.fulfillment == FulfillmentType::Delivery =>
            {
                Delivering
            }
            (TransitionEvent::Complete, Ready) if order.fulfillment == FulfillmentType::Pickup => Completed,
            (TransitionEvent::Complete, Delivering)
                if order.fulfillment == FulfillmentType::Delivery =>
            {
                Completed
            }
            _ => return Err(OrderError::InvalidTransition { from: order.status, event }),
        };
        Ok(target)
    }

    /// Openness check for the tracking path: holds the order lock only long
    /// enough to read the status and destination.
    pub(crate) async fn ensure_open_for_tracking(
        &self,
        order_id: Uuid,
    ) -> Result<(OrderStatus, Option<DeliveryAddress>), OrderError> {
        let entry = self.entry(order_id).await?;
        let order = entry.lock().await;
        if order.status.is_terminal() {
            return Err(OrderError::Closed(order_id));
        }
        Ok((order.status, order.delivery_address.clone()))
    }
}
