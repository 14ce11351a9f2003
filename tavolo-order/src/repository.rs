use crate::models::Order;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Order storage failed: {0}")]
    Backend(String),
}

/// Contract for order persistence. Storage itself is an external collaborator;
/// the lifecycle manager only ever talks to this trait.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn save(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn get(&self, order_id: Uuid) -> Result<Option<Order>, RepositoryError>;

    async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, RepositoryError>;

    async fn list_for_store(&self, store_id: Uuid) -> Result<Vec<Order>, RepositoryError>;
}
