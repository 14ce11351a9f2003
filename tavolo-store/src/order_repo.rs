use async_trait::async_trait;
use std::collections::HashMap;
use tavolo_order::repository::{OrderRepository, RepositoryError};
use tavolo_order::Order;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory order store. The lifecycle manager holds the authoritative copy;
/// this keeps the durable snapshot a real backend would.
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self { orders: RwLock::new(HashMap::new()) }
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), RepositoryError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, order_id: Uuid) -> Result<Option<Order>, RepositoryError> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn list_for_store(&self, store_id: Uuid) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.store_id == store_id)
            .cloned()
            .collect())
    }
}
