use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderPlacedEvent {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Uuid,
    pub fulfillment: String,
    pub total_cents: i32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct NewOrderEvent {
    pub order_id: Uuid,
    pub store_id: Uuid,
    pub store_owner_id: Uuid,
    pub item_count: usize,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderStatusChangedEvent {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Uuid,
    pub from: String,
    pub to: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderRejectedEvent {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Uuid,
    pub reason: String,
    pub timestamp: i64,
}
