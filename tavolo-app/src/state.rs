use crate::checkout::CheckoutOrchestrator;
use crate::notify::NotificationDispatcher;
use std::sync::Arc;
use std::time::Duration;
use tavolo_cart::SessionCart;
use tavolo_core::catalog::MenuCatalog;
use tavolo_core::directory::StoreDirectory;
use tavolo_core::notify::NotificationSink;
use tavolo_core::routing::RoutingAdapter;
use tavolo_delivery::DeliveryEstimator;
use tavolo_order::repository::OrderRepository;
use tavolo_order::{LiveTracker, OrderManager};
use tavolo_store::Config;

/// Everything the (external) API layer needs, wired once at startup
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn MenuCatalog>,
    pub directory: Arc<dyn StoreDirectory>,
    pub estimator: Arc<DeliveryEstimator>,
    pub orders: Arc<OrderManager>,
    pub notifications: Arc<NotificationDispatcher>,
}

impl AppState {
    pub fn new(
        config: &Config,
        catalog: Arc<dyn MenuCatalog>,
        directory: Arc<dyn StoreDirectory>,
        routing: Arc<dyn RoutingAdapter>,
        repo: Arc<dyn OrderRepository>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let estimator = Arc::new(DeliveryEstimator::new(
            routing,
            Duration::from_millis(config.delivery.routing_timeout_ms),
        ));
        let orders = Arc::new(OrderManager::new(repo));
        let notifications = Arc::new(NotificationDispatcher::start(
            sink,
            config.notify.queue_capacity,
            config.notify.workers,
        ));

        Self { catalog, directory, estimator, orders, notifications }
    }

    /// A fresh cart bound to one customer session
    pub fn session_cart(&self, session_id: impl Into<String>) -> SessionCart {
        SessionCart::new(session_id, self.catalog.clone())
    }

    pub fn checkout(&self) -> CheckoutOrchestrator {
        CheckoutOrchestrator::new(
            self.directory.clone(),
            self.estimator.clone(),
            self.orders.clone(),
            self.notifications.clone(),
        )
    }

    pub fn tracker(&self) -> LiveTracker {
        LiveTracker::new(self.orders.clone(), self.estimator.clone())
    }
}
