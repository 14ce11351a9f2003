pub mod authz;
pub mod manager;
pub mod models;
pub mod projection;
pub mod repository;
pub mod tracking;

pub use manager::{OrderManager, OrderError, PlaceOrderRequest, Transitioned};
pub use models::{DeliveryAddress, Order, OrderItem, OrderStatus};
pub use projection::{OrderItemView, OrderView};
pub use repository::OrderRepository;
pub use tracking::{LiveTracker, PingOutcome, TrackingError};
