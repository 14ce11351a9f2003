use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tavolo_shared::GeoPoint;
use uuid::Uuid;

/// How an order leaves the store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentType {
    Pickup,
    Delivery,
}

impl FulfillmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentType::Pickup => "PICKUP",
            FulfillmentType::Delivery => "DELIVERY",
        }
    }
}

/// Store-configured delivery fee policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeePolicy {
    Free,
    Flat { fee_cents: i32 },
    PerKm { base_cents: i32, per_km_cents: i32 },
}

impl FeePolicy {
    /// Fee in cents for a routed distance
    pub fn fee_for_distance(&self, distance_km: f64) -> i32 {
        match self {
            FeePolicy::Free => 0,
            FeePolicy::Flat { fee_cents } => *fee_cents,
            FeePolicy::PerKm { base_cents, per_km_cents } => {
                base_cents + (*per_km_cents as f64 * distance_km).round() as i32
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorePolicy {
    pub minimum_order_cents: i32,
    pub fee_policy: FeePolicy,
    pub accepted_fulfillment: Vec<FulfillmentType>,
}

impl StorePolicy {
    pub fn accepts(&self, fulfillment: FulfillmentType) -> bool {
        self.accepted_fulfillment.contains(&fulfillment)
    }
}

/// A store as the directory collaborator knows it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: GeoPoint,
    pub policy: StorePolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Store directory lookup failed: {0}")]
    LookupFailed(String),
}

/// Contract for the store policy lookup collaborator
#[async_trait]
pub trait StoreDirectory: Send + Sync {
    async fn get_store(&self, store_id: Uuid) -> Result<Option<StoreRecord>, DirectoryError>;
}
