use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tavolo_cart::{CartLine, Customization};
use tavolo_core::directory::FulfillmentType;
use tavolo_shared::pii::Masked;
use tavolo_shared::GeoPoint;
use uuid::Uuid;

/// Order status in the fulfillment lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Placed,
    Accepted,
    Preparing,
    Ready,
    Delivering,
    Completed,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    /// Terminal statuses have no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Rejected | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Delivering => "DELIVERING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Where a delivery order goes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub id: Uuid,
    pub label: Option<String>,
    pub location: GeoPoint,
}

/// A line item frozen at order-placement time, immune to later menu changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub name: String,
    pub unit_price_cents: i32,
    pub quantity: u32,
    pub customization: Customization,
}

impl OrderItem {
    pub fn from_cart_line(line: &CartLine) -> Self {
        Self {
            id: Uuid::new_v4(),
            menu_item_id: line.menu_item_id,
            name: line.name.clone(),
            unit_price_cents: line.unit_price_cents,
            quantity: line.quantity,
            customization: line.customization.clone(),
        }
    }

    pub fn line_total_cents(&self) -> i32 {
        self.unit_price_cents * self.quantity as i32
    }
}

/// One nullable timestamp per status the order has passed through.
/// Once set, a slot is never cleared or rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTimestamps {
    pub placed_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub preparing_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub delivering_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl StatusTimestamps {
    fn new(placed_at: DateTime<Utc>) -> Self {
        Self {
            placed_at,
            accepted_at: None,
            preparing_at: None,
            ready_at: None,
            delivering_at: None,
            completed_at: None,
            rejected_at: None,
            cancelled_at: None,
        }
    }

    pub fn get(&self, status: OrderStatus) -> Option<DateTime<Utc>> {
        match status {
            OrderStatus::Placed => Some(self.placed_at),
            OrderStatus::Accepted => self.accepted_at,
            OrderStatus::Preparing => self.preparing_at,
            OrderStatus::Ready => self.ready_at,
            OrderStatus::Delivering => self.delivering_at,
            OrderStatus::Completed => self.completed_at,
            OrderStatus::Rejected => self.rejected_at,
            OrderStatus::Cancelled => self.cancelled_at,
        }
    }

    /// Stamp a status slot. Returns false if the slot was already set.
    fn stamp(&mut self, status: OrderStatus, at: DateTime<Utc>) -> bool {
        let slot = match status {
            OrderStatus::Placed => return false,
            OrderStatus::Accepted => &mut self.accepted_at,
            OrderStatus::Preparing => &mut self.preparing_at,
            OrderStatus::Ready => &mut self.ready_at,
            OrderStatus::Delivering => &mut self.delivering_at,
            OrderStatus::Completed => &mut self.completed_at,
            OrderStatus::Rejected => &mut self.rejected_at,
            OrderStatus::Cancelled => &mut self.cancelled_at,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(at);
        true
    }
}

/// Live position and refreshed ETA for an in-flight delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryTracking {
    pub driver_position: GeoPoint,
    pub distance_km: f64,
    pub eta_minutes: u32,
    /// Arrival sequence of the ping this reading came from
    pub updated_seq: u64,
    pub updated_at: DateTime<Utc>,
}

/// The confirmed, persisted fulfillment unit.
/// Owned exclusively by the fulfillment pipeline; everyone else sees projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_contact: Option<Masked<String>>,
    pub store_id: Uuid,
    pub store_owner_id: Uuid,
    pub fulfillment: FulfillmentType,
    pub delivery_address: Option<DeliveryAddress>,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub subtotal_cents: i32,
    pub delivery_fee_cents: i32,
    pub total_cents: i32,
    pub customer_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub assigned_driver_id: Option<Uuid>,
    pub timestamps: StatusTimestamps,
    pub tracking: Option<DeliveryTracking>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub(crate) fn new_placed(
        customer_id: Uuid,
        customer_contact: Option<String>,
        store_id: Uuid,
        store_owner_id: Uuid,
        fulfillment: FulfillmentType,
        delivery_address: Option<DeliveryAddress>,
        items: Vec<OrderItem>,
        delivery_fee_cents: i32,
        customer_notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let mut order = Self {
            id: Uuid::new_v4(),
            customer_id,
            customer_contact: customer_contact.map(Masked),
            store_id,
            store_owner_id,
            fulfillment,
            delivery_address,
            items,
            status: OrderStatus::Placed,
            subtotal_cents: 0,
            delivery_fee_cents,
            total_cents: 0,
            customer_notes,
            rejection_reason: None,
            assigned_driver_id: None,
            timestamps: StatusTimestamps::new(now),
            tracking: None,
            updated_at: now,
        };
        order.recompute_totals();
        order
    }

    /// Subtotal and total always derive from the frozen items, never from input
    pub fn recompute_totals(&mut self) {
        self.subtotal_cents = self.items.iter().map(|i| i.line_total_cents()).sum();
        self.total_cents = self.subtotal_cents + self.delivery_fee_cents;
    }

    /// Move to a new status, stamping its timestamp exactly once.
    /// Returns false if that status was already stamped.
    pub(crate) fn set_status(&mut self, new_status: OrderStatus, at: DateTime<Utc>) -> bool {
        if !self.timestamps.stamp(new_status, at) {
            return false;
        }
        self.status = new_status;
        self.updated_at = at;
        true
    }

    /// Apply a live tracking reading. Only an open, in-flight delivery accepts
    /// readings, and only when the reading is newer than the current one.
    pub(crate) fn apply_tracking(&mut self, reading: DeliveryTracking) -> bool {
        if self.status != OrderStatus::Delivering {
            return false;
        }
        if let Some(current) = &self.tracking {
            if current.updated_seq >= reading.updated_seq {
                return false;
            }
        }
        self.updated_at = reading.updated_at;
        self.tracking = Some(reading);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(seq: u64) -> DeliveryTracking {
        DeliveryTracking {
            driver_position: GeoPoint::new(41.39, 2.17),
            distance_km: 1.2,
            eta_minutes: 4,
            updated_seq: seq,
            updated_at: Utc::now(),
        }
    }

    fn delivering_order() -> Order {
        let mut order = Order::new_placed(
            Uuid::new_v4(),
            None,
            Uuid::new_v4(),
            Uuid::new_v4(),
            FulfillmentType::Delivery,
            Some(DeliveryAddress {
                id: Uuid::new_v4(),
                label: None,
                location: GeoPoint::new(41.40, 2.18),
            }),
            vec![],
            250,
            None,
        );
        assert!(order.set_status(OrderStatus::Accepted, Utc::now()));
        assert!(order.set_status(OrderStatus::Preparing, Utc::now()));
        assert!(order.set_status(OrderStatus::Ready, Utc::now()));
        assert!(order.set_status(OrderStatus::Delivering, Utc::now()));
        order
    }

    #[test]
    fn test_timestamps_are_append_only() {
        let mut order = delivering_order();
        // re-stamping an already-visited status must be refused
        assert!(!order.set_status(OrderStatus::Accepted, Utc::now()));
        assert_eq!(order.status, OrderStatus::Delivering);
    }

    #[test]
    fn test_totals_derive_from_frozen_items() {
        let line = CartLine {
            id: Uuid::new_v4(),
            menu_item_id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            name: "Carbonara".to_string(),
            unit_price_cents: 1250,
            quantity: 2,
            customization: Customization::plain(),
            added_at: Utc::now(),
        };
        let mut order = Order::new_placed(
            Uuid::new_v4(),
            None,
            Uuid::new_v4(),
            Uuid::new_v4(),
            FulfillmentType::Delivery,
            None,
            vec![OrderItem::from_cart_line(&line)],
            300,
            None,
        );

        assert_eq!(order.subtotal_cents, 2500);
        assert_eq!(order.total_cents, 2800);

        // totals cannot be trusted from outside; recompute repairs any drift
        order.total_cents = 1;
        order.recompute_totals();
        assert_eq!(order.total_cents, 2800);
    }

    #[test]
    fn test_stale_tracking_reading_is_ignored() {
        let mut order = delivering_order();

        assert!(order.apply_tracking(reading(2)));
        assert!(!order.apply_tracking(reading(1)));
        assert_eq!(order.tracking.as_ref().unwrap().updated_seq, 2);

        assert!(order.apply_tracking(reading(3)));
        assert_eq!(order.tracking.as_ref().unwrap().updated_seq, 3);
    }

    #[test]
    fn test_closed_order_ignores_tracking() {
        let mut order = delivering_order();
        assert!(order.set_status(OrderStatus::Completed, Utc::now()));
        assert!(!order.apply_tracking(reading(9)));
        assert!(order.tracking.is_none());
    }
}
