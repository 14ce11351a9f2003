use async_trait::async_trait;
use std::collections::HashMap;
use tavolo_core::directory::{DirectoryError, StoreDirectory, StoreRecord};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store directory, the stand-in for the store policy lookup service
pub struct InMemoryStoreDirectory {
    stores: RwLock<HashMap<Uuid, StoreRecord>>,
}

impl InMemoryStoreDirectory {
    pub fn new() -> Self {
        Self { stores: RwLock::new(HashMap::new()) }
    }

    pub async fn upsert(&self, store: StoreRecord) {
        self.stores.write().await.insert(store.id, store);
    }
}

impl Default for InMemoryStoreDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreDirectory for InMemoryStoreDirectory {
    async fn get_store(&self, store_id: Uuid) -> Result<Option<StoreRecord>, DirectoryError> {
        Ok(self.stores.read().await.get(&store_id).cloned())
    }
}
