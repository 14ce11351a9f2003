use crate::models::DeliveryQuote;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tavolo_core::directory::{FulfillmentType, StorePolicy};
use tavolo_core::routing::{RouteLeg, RoutingAdapter, RoutingError};
use tavolo_shared::GeoPoint;

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("Subtotal {subtotal_cents} is below the store minimum {minimum_cents}, short by {shortfall_cents}")]
    BelowMinimumOrder {
        minimum_cents: i32,
        subtotal_cents: i32,
        shortfall_cents: i32,
    },

    #[error("Routing unavailable: {0}")]
    RoutingUnavailable(#[from] RoutingError),

    #[error("Store does not accept {0:?} orders")]
    FulfillmentNotAccepted(FulfillmentType),

    #[error("Delivery quotes require a destination")]
    MissingDestination,
}

/// Orchestrates the routing capability into priced, timed delivery quotes
pub struct DeliveryEstimator {
    routing: Arc<dyn RoutingAdapter>,
    timeout: Duration,
}

impl DeliveryEstimator {
    pub fn new(routing: Arc<dyn RoutingAdapter>, timeout: Duration) -> Self {
        Self { routing, timeout }
    }

    /// Quote a candidate order.
    ///
    /// Pickup short-circuits to the zero quote without touching routing.
    /// Delivery enforces the store minimum before any external call, then
    /// routes origin -> destination and prices the leg with the store's policy.
    pub async fn quote(
        &self,
        origin: GeoPoint,
        destination: Option<GeoPoint>,
        fulfillment: FulfillmentType,
        subtotal_cents: i32,
        policy: &StorePolicy,
    ) -> Result<DeliveryQuote, QuoteError> {
        if !policy.accepts(fulfillment) {
            return Err(QuoteError::FulfillmentNotAccepted(fulfillment));
        }

        if fulfillment == FulfillmentType::Pickup {
            return Ok(DeliveryQuote::pickup());
        }

        if subtotal_cents < policy.minimum_order_cents {
            return Err(QuoteError::BelowMinimumOrder {
                minimum_cents: policy.minimum_order_cents,
                subtotal_cents,
                shortfall_cents: policy.minimum_order_cents - subtotal_cents,
            });
        }

        let destination = destination.ok_or(QuoteError::MissingDestination)?;
        let leg = self.bounded_route(origin, destination).await?;

        Ok(DeliveryQuote {
            fulfillment: FulfillmentType::Delivery,
            distance_km: leg.distance_km,
            duration_minutes: leg.duration_minutes,
            fee_cents: policy.fee_policy.fee_for_distance(leg.distance_km),
        })
    }

    /// One origin against many destinations in a single external call.
    /// Legs come back index-aligned with `destinations`.
    pub async fn quote_matrix(
        &self,
        origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<RouteLeg>, QuoteError> {
        let fut = self.routing.route_matrix(origin, destinations);
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RoutingError::Timeout(self.timeout.as_millis() as u64).into()),
        }
    }

    /// Route a driver's current position against the delivery destination,
    /// used to refresh an in-flight ETA
    pub async fn live_leg(
        &self,
        driver_position: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteLeg, QuoteError> {
        self.bounded_route(driver_position, destination).await
    }

    async fn bounded_route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<RouteLeg, QuoteError> {
        let fut = self.routing.route(origin, destination);
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "routing call timed out");
                Err(RoutingError::Timeout(self.timeout.as_millis() as u64).into())
            }
        }
    }
}

/// Haversine-based stand-in for the real routing provider. Assumes roads add
/// ~30% over the great-circle distance and average 30 km/h in town.
pub struct MockRoutingAdapter {
    calls: AtomicU64,
}

const ROAD_FACTOR: f64 = 1.3;
const AVG_SPEED_KMH: f64 = 30.0;

impl MockRoutingAdapter {
    pub fn new() -> Self {
        Self { calls: AtomicU64::new(0) }
    }

    /// Number of external calls made, for asserting call bounds in tests
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn leg(origin: GeoPoint, destination: GeoPoint) -> RouteLeg {
        let distance_km = origin.haversine_km(&destination) * ROAD_FACTOR;
        let duration_minutes = (distance_km / AVG_SPEED_KMH * 60.0).ceil() as u32;
        RouteLeg { distance_km, duration_minutes }
    }
}

impl Default for MockRoutingAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoutingAdapter for MockRoutingAdapter {
    async fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<RouteLeg, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::leg(origin, destination))
    }

    async fn route_matrix(
        &self,
        origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<RouteLeg>, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(destinations.iter().map(|d| Self::leg(origin, *d)).collect())
    }
}

/// Adapter that always fails, for exercising the unavailable path
pub struct FailingRoutingAdapter;

#[async_trait]
impl RoutingAdapter for FailingRoutingAdapter {
    async fn route(&self, _origin: GeoPoint, _destination: GeoPoint) -> Result<RouteLeg, RoutingError> {
        Err(RoutingError::Unavailable("simulated outage".to_string()))
    }

    async fn route_matrix(
        &self,
        _origin: GeoPoint,
        _destinations: &[GeoPoint],
    ) -> Result<Vec<RouteLeg>, RoutingError> {
        Err(RoutingError::Unavailable("simulated outage".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tavolo_core::directory::FeePolicy;

    fn policy(minimum_order_cents: i32, fee_policy: FeePolicy) -> StorePolicy {
        StorePolicy {
            minimum_order_cents,
            fee_policy,
            accepted_fulfillment: vec![FulfillmentType::Pickup, FulfillmentType::Delivery],
        }
    }

    fn estimator() -> (Arc<MockRoutingAdapter>, DeliveryEstimator) {
        let routing = Arc::new(MockRoutingAdapter::new());
        let estimator = DeliveryEstimator::new(routing.clone(), Duration::from_secs(3));
        (routing, estimator)
    }

    fn store_point() -> GeoPoint {
        GeoPoint::new(41.3874, 2.1686)
    }

    fn customer_point() -> GeoPoint {
        GeoPoint::new(41.4036, 2.1744)
    }

    #[tokio::test]
    async fn test_pickup_quote_is_zero_and_never_routes() {
        let (routing, estimator) = estimator();

        let quote = estimator
            .quote(store_point(), None, FulfillmentType::Pickup, 500, &policy(2000, FeePolicy::Free))
            .await
            .unwrap();

        assert!(quote.is_pickup());
        assert_eq!(quote.distance_km, 0.0);
        assert_eq!(quote.fee_cents, 0);
        assert_eq!(quote.duration_minutes, 0);
        assert_eq!(routing.calls(), 0);
    }

    #[tokio::test]
    async fn test_below_minimum_fails_with_shortfall_before_routing() {
        let (routing, estimator) = estimator();

        let err = estimator
            .quote(
                store_point(),
                Some(customer_point()),
                FulfillmentType::Delivery,
                1800,
                &policy(2000, FeePolicy::Free),
            )
            .await
            .unwrap_err();

        match err {
            QuoteError::BelowMinimumOrder { shortfall_cents, minimum_cents, subtotal_cents } => {
                assert_eq!(shortfall_cents, 200);
                assert_eq!(minimum_cents, 2000);
                assert_eq!(subtotal_cents, 1800);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(routing.calls(), 0);
    }

    #[tokio::test]
    async fn test_flat_fee_policy_applies() {
        let (_, estimator) = estimator();

        let quote = estimator
            .quote(
                store_point(),
                Some(customer_point()),
                FulfillmentType::Delivery,
                2500,
                &policy(0, FeePolicy::Flat { fee_cents: 299 }),
            )
            .await
            .unwrap();

        assert_eq!(quote.fee_cents, 299);
        assert!(quote.distance_km > 0.0);
        assert!(quote.duration_minutes > 0);
    }

    #[tokio::test]
    async fn test_distance_based_fee_scales_with_the_leg() {
        let (_, estimator) = estimator();
        let fee_policy = FeePolicy::PerKm { base_cents: 100, per_km_cents: 50 };

        let quote = estimator
            .quote(
                store_point(),
                Some(customer_point()),
                FulfillmentType::Delivery,
                2500,
                &policy(0, fee_policy.clone()),
            )
            .await
            .unwrap();

        assert_eq!(quote.fee_cents, fee_policy.fee_for_distance(quote.distance_km));
        assert!(quote.fee_cents > 100);
    }

    #[tokio::test]
    async fn test_routing_failure_is_explicit_never_a_default() {
        let estimator = DeliveryEstimator::new(Arc::new(FailingRoutingAdapter), Duration::from_secs(3));

        let err = estimator
            .quote(
                store_point(),
                Some(customer_point()),
                FulfillmentType::Delivery,
                2500,
                &policy(0, FeePolicy::Free),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, QuoteError::RoutingUnavailable(RoutingError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_slow_routing_backend_times_out() {
        struct SlowAdapter;

        #[async_trait]
        impl RoutingAdapter for SlowAdapter {
            async fn route(&self, _o: GeoPoint, _d: GeoPoint) -> Result<RouteLeg, RoutingError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(RouteLeg { distance_km: 1.0, duration_minutes: 1 })
            }

            async fn route_matrix(
                &self,
                _o: GeoPoint,
                _d: &[GeoPoint],
            ) -> Result<Vec<RouteLeg>, RoutingError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(vec![])
            }
        }

        let estimator = DeliveryEstimator::new(Arc::new(SlowAdapter), Duration::from_millis(20));

        let err = estimator
            .quote(
                store_point(),
                Some(customer_point()),
                FulfillmentType::Delivery,
                2500,
                &policy(0, FeePolicy::Free),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, QuoteError::RoutingUnavailable(RoutingError::Timeout(20))));
    }

    #[tokio::test]
    async fn test_matrix_quote_is_one_call_and_index_aligned() {
        let (routing, estimator) = estimator();
        let destinations = vec![
            customer_point(),
            GeoPoint::new(41.42, 2.18),
            GeoPoint::new(41.38, 2.15),
        ];

        let legs = estimator.quote_matrix(store_point(), &destinations).await.unwrap();

        assert_eq!(legs.len(), destinations.len());
        assert_eq!(routing.calls(), 1);
        for (leg, dest) in legs.iter().zip(&destinations) {
            let direct = store_point().haversine_km(dest) * 1.3;
            assert!((leg.distance_km - direct).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_unaccepted_fulfillment_is_rejected() {
        let (_, estimator) = estimator();
        let pickup_only = StorePolicy {
            minimum_order_cents: 0,
            fee_policy: FeePolicy::Free,
            accepted_fulfillment: vec![FulfillmentType::Pickup],
        };

        let err = estimator
            .quote(
                store_point(),
                Some(customer_point()),
                FulfillmentType::Delivery,
                2500,
                &pickup_only,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, QuoteError::FulfillmentNotAccepted(FulfillmentType::Delivery)));
    }
}
