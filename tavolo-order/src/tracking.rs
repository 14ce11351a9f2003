use crate::manager::{OrderError, OrderManager};
use crate::models::{DeliveryTracking, OrderStatus};
use chrono::Utc;
use std::sync::Arc;
use tavolo_delivery::{DeliveryEstimator, QuoteError};
use tavolo_shared::GeoPoint;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Routing(#[from] QuoteError),
}

/// What became of a driver position ping
#[derive(Debug, Clone)]
pub enum PingOutcome {
    Applied(DeliveryTracking),
    /// The order is closed, not yet delivering, or a newer ping already landed
    Ignored,
}

/// Refreshes in-flight ETAs from driver position pings.
///
/// Pings only take the order's lock long enough to check it is still open;
/// the routing call runs outside the lock, and its result is applied only if
/// the order is still DELIVERING and no newer ping has landed meanwhile.
pub struct LiveTracker {
    orders: Arc<OrderManager>,
    estimator: Arc<DeliveryEstimator>,
}

impl LiveTracker {
    pub fn new(orders: Arc<OrderManager>, estimator: Arc<DeliveryEstimator>) -> Self {
        Self { orders, estimator }
    }

    pub async fn record_driver_position(
        &self,
        order_id: Uuid,
        position: GeoPoint,
    ) -> Result<PingOutcome, TrackingError> {
        // Arrival order, not claimed timestamps, decides which ping is newest
        let seq = self.orders.next_ping_seq();

        let (status, address) = match self.orders.ensure_open_for_tracking(order_id).await {
            Ok(peek) => peek,
            Err(OrderError::Closed(_)) => {
                tracing::debug!(order_id = %order_id, "ping for closed order ignored");
                return Ok(PingOutcome::Ignored);
            }
            Err(other) => return Err(other.into()),
        };

        if status != OrderStatus::Delivering {
            tracing::debug!(order_id = %order_id, status = status.as_str(), "ping before delivery started ignored");
            return Ok(PingOutcome::Ignored);
        }
        let destination = match address {
            Some(address) => address.location,
            // a delivering order always carries an address; treat a missing one as closed data
            None => return Ok(PingOutcome::Ignored),
        };

        let leg = self.estimator.live_leg(position, destination).await?;

        let reading = DeliveryTracking {
            driver_position: position,
            distance_km: leg.distance_km,
            eta_minutes: leg.duration_minutes,
            updated_seq: seq,
            updated_at: Utc::now(),
        };

        let entry = self.orders.entry(order_id).await?;
        let mut order = entry.lock().await;
        if order.apply_tracking(reading.clone()) {
            self.orders.persist(&order).await?;
            tracing::debug!(
                order_id = %order_id,
                eta_minutes = reading.eta_minutes,
                "live estimate refreshed"
            );
            Ok(PingOutcome::Applied(reading))
        } else {
            Ok(PingOutcome::Ignored)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::tests::MemoryRepo;
    use crate::manager::PlaceOrderRequest;
    use crate::models::DeliveryAddress;
    use chrono::Utc;
    use std::time::Duration;
    use tavolo_cart::{CartLine, CartSnapshot, Customization};
    use tavolo_core::directory::FulfillmentType;
    use tavolo_core::identity::Actor;
    use tavolo_delivery::estimator::FailingRoutingAdapter;
    use tavolo_delivery::{DeliveryQuote, MockRoutingAdapter};

    async fn delivering_fixture(
        estimator: Arc<DeliveryEstimator>,
    ) -> (Arc<OrderManager>, LiveTracker, Uuid, Actor, Actor) {
        let manager = Arc::new(OrderManager::new(Arc::new(MemoryRepo::new())));
        let store_id = Uuid::new_v4();
        let owner = Actor::store_owner(Uuid::new_v4());
        let driver = Actor::driver(Uuid::new_v4());

        let line = CartLine {
            id: Uuid::new_v4(),
            menu_item_id: Uuid::new_v4(),
            store_id,
            name: "Pad Thai".to_string(),
            unit_price_cents: 1300,
            quantity: 1,
            customization: Customization::plain(),
            added_at: Utc::now(),
        };
        let order = manager
            .place_order(PlaceOrderRequest {
                customer_id: Uuid::new_v4(),
                customer_contact: None,
                store_id,
                store_owner_id: owner.id,
                fulfillment: FulfillmentType::Delivery,
                delivery_address: Some(DeliveryAddress {
                    id: Uuid::new_v4(),
                    label: None,
                    location: GeoPoint::new(41.40, 2.18),
                }),
                snapshot: CartSnapshot {
                    store_id: Some(store_id),
                    lines: vec![line],
                    total_quantity: 1,
                    subtotal_cents: 1300,
                    taken_at: Utc::now(),
                },
                quote: DeliveryQuote {
                    fulfillment: FulfillmentType::Delivery,
                    distance_km: 2.0,
                    duration_minutes: 8,
                    fee_cents: 200,
                },
                customer_notes: None,
            })
            .await
            .unwrap();

        manager.accept(order.id, &owner).await.unwrap();
        manager.start_preparing(order.id, &owner).await.unwrap();
        manager.mark_ready(order.id, &owner).await.unwrap();
        manager.start_delivering(order.id, &driver).await.unwrap();

        let tracker = LiveTracker::new(manager.clone(), estimator);
        (manager, tracker, order.id, owner, driver)
    }

    fn mock_estimator() -> Arc<DeliveryEstimator> {
        Arc::new(DeliveryEstimator::new(
            Arc::new(MockRoutingAdapter::new()),
            Duration::from_secs(3),
        ))
    }

    #[tokio::test]
    async fn test_ping_refreshes_the_live_estimate() {
        let (manager, tracker, order_id, _, _) = delivering_fixture(mock_estimator()).await;

        let outcome = tracker
            .record_driver_position(order_id, GeoPoint::new(41.395, 2.175))
            .await
            .unwrap();
        assert!(matches!(outcome, PingOutcome::Applied(_)));

        let order = manager.get(order_id).await.unwrap();
        let tracking = order.tracking.unwrap();
        assert!(tracking.distance_km > 0.0);
        assert_eq!(tracking.updated_seq, 1);
    }

    #[tokio::test]
    async fn test_later_pings_supersede_earlier_ones() {
        let (manager, tracker, order_id, _, _) = delivering_fixture(mock_estimator()).await;

        tracker.record_driver_position(order_id, GeoPoint::new(41.395, 2.175)).await.unwrap();
        tracker.record_driver_position(order_id, GeoPoint::new(41.398, 2.178)).await.unwrap();

        let order = manager.get(order_id).await.unwrap();
        let tracking = order.tracking.unwrap();
        assert_eq!(tracking.updated_seq, 2);
        assert_eq!(tracking.driver_position, GeoPoint::new(41.398, 2.178));
    }

    #[tokio::test]
    async fn test_ping_after_completion_is_silently_ignored() {
        let (manager, tracker, order_id, _, driver) = delivering_fixture(mock_estimator()).await;
        manager.complete(order_id, &driver).await.unwrap();

        let outcome = tracker
            .record_driver_position(order_id, GeoPoint::new(41.40, 2.18))
            .await
            .unwrap();
        assert!(matches!(outcome, PingOutcome::Ignored));

        let order = manager.get(order_id).await.unwrap();
        assert!(order.tracking.is_none());
    }

    #[tokio::test]
    async fn test_routing_outage_surfaces_on_the_ping_path() {
        let failing = Arc::new(DeliveryEstimator::new(
            Arc::new(FailingRoutingAdapter),
            Duration::from_secs(3),
        ));
        let (_, tracker, order_id, _, _) = delivering_fixture(failing).await;

        let err = tracker
            .record_driver_position(order_id, GeoPoint::new(41.39, 2.17))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackingError::Routing(QuoteError::RoutingUnavailable(_))));
    }

    #[tokio::test]
    async fn test_ping_for_unknown_order_is_an_error() {
        let (_, tracker, _, _, _) = delivering_fixture(mock_estimator()).await;
        let err = tracker
            .record_driver_position(Uuid::new_v4(), GeoPoint::new(41.39, 2.17))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackingError::Order(OrderError::NotFound(_))));
    }
}
