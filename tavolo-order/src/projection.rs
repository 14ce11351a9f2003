use crate::models::{Order, OrderItem, OrderStatus, StatusTimestamps};
use serde::{Deserialize, Serialize};
use tavolo_cart::Customization;
use tavolo_core::directory::FulfillmentType;
use tavolo_shared::pii::Masked;
use uuid::Uuid;

/// Read-only projection of an order, safe to hand to customers and stores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_contact: Option<Masked<String>>,
    pub store_id: Uuid,
    pub status: OrderStatus,
    pub fulfillment: FulfillmentType,
    pub items: Vec<OrderItemView>,
    pub subtotal_cents: i32,
    pub delivery_fee_cents: i32,
    pub total_cents: i32,
    pub customer_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub timestamps: StatusTimestamps,
    pub eta_minutes: Option<u32>,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemView {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub name: String,
    pub unit_price_cents: i32,
    pub quantity: u32,
    pub line_total_cents: i32,
    pub customization: Customization,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            menu_item_id: item.menu_item_id,
            name: item.name.clone(),
            unit_price_cents: item.unit_price_cents,
            quantity: item.quantity,
            line_total_cents: item.line_total_cents(),
            customization: item.customization.clone(),
        }
    }
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            customer_contact: order.customer_contact.clone(),
            store_id: order.store_id,
            status: order.status,
            fulfillment: order.fulfillment,
            items: order.items.iter().map(OrderItemView::from).collect(),
            subtotal_cents: order.subtotal_cents,
            delivery_fee_cents: order.delivery_fee_cents,
            total_cents: order.total_cents,
            customer_notes: order.customer_notes.clone(),
            rejection_reason: order.rejection_reason.clone(),
            timestamps: order.timestamps.clone(),
            eta_minutes: order.tracking.as_ref().map(|t| t.eta_minutes),
            distance_km: order.tracking.as_ref().map(|t| t.distance_km),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeliveryAddress;
    use tavolo_shared::GeoPoint;

    #[test]
    fn test_view_mirrors_the_aggregate() {
        let order = Order::new_placed(
            Uuid::new_v4(),
            Some("ada@example.com".to_string()),
            Uuid::new_v4(),
            Uuid::new_v4(),
            FulfillmentType::Delivery,
            Some(DeliveryAddress {
                id: Uuid::new_v4(),
                label: None,
                location: GeoPoint::new(41.40, 2.18),
            }),
            vec![],
            300,
            Some("ring twice".to_string()),
        );

        let view = OrderView::from(&order);
        assert_eq!(view.id, order.id);
        assert_eq!(view.status, OrderStatus::Placed);
        assert_eq!(view.total_cents, order.total_cents);
        assert_eq!(view.customer_notes.as_deref(), Some("ring twice"));
        assert!(view.eta_minutes.is_none());

        // the contact never leaks through Debug formatting
        let debugged = format!("{:?}", view);
        assert!(!debugged.contains("ada@example.com"));
    }
}
