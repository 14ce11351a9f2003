use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A live menu entry as the catalog currently sells it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub price_cents: i32,
    pub is_available: bool,
    pub metadata: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog lookup failed: {0}")]
    LookupFailed(String),
}

/// Contract for the menu catalog collaborator
#[async_trait]
pub trait MenuCatalog: Send + Sync {
    /// Fetch an item's live name, price and availability, or None if unknown
    async fn get_item(&self, item_id: Uuid) -> Result<Option<MenuItem>, CatalogError>;
}
