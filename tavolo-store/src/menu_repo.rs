use async_trait::async_trait;
use std::collections::HashMap;
use tavolo_core::catalog::{CatalogError, MenuCatalog, MenuItem};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory menu catalog, used by tests and local composition.
/// The real catalog service lives behind the same trait.
pub struct InMemoryMenuCatalog {
    items: RwLock<HashMap<Uuid, MenuItem>>,
}

impl InMemoryMenuCatalog {
    pub fn new() -> Self {
        Self { items: RwLock::new(HashMap::new()) }
    }

    pub async fn upsert(&self, item: MenuItem) {
        self.items.write().await.insert(item.id, item);
    }

    /// Seed helper: create an available item and return its id
    pub async fn seed(&self, store_id: Uuid, name: &str, price_cents: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.upsert(MenuItem {
            id,
            store_id,
            name: name.to_string(),
            price_cents,
            is_available: true,
            metadata: serde_json::json!({}),
        })
        .await;
        id
    }

    pub async fn set_price(&self, item_id: Uuid, price_cents: i32) {
        if let Some(item) = self.items.write().await.get_mut(&item_id) {
            item.price_cents = price_cents;
        }
    }

    pub async fn set_available(&self, item_id: Uuid, is_available: bool) {
        if let Some(item) = self.items.write().await.get_mut(&item_id) {
            item.is_available = is_available;
        }
    }
}

impl Default for InMemoryMenuCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MenuCatalog for InMemoryMenuCatalog {
    async fn get_item(&self, item_id: Uuid) -> Result<Option<MenuItem>, CatalogError> {
        Ok(self.items.read().await.get(&item_id).cloned())
    }
}
