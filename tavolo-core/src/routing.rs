use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tavolo_shared::GeoPoint;

/// One routed leg between two coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_km: f64,
    pub duration_minutes: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("Routing backend unavailable: {0}")]
    Unavailable(String),

    #[error("Routing request timed out after {0} ms")]
    Timeout(u64),
}

/// Contract for the external routing / distance-matrix capability
#[async_trait]
pub trait RoutingAdapter: Send + Sync {
    /// Route a single origin -> destination pair
    async fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<RouteLeg, RoutingError>;

    /// Route one origin against many destinations in a single call.
    /// The returned legs are index-aligned with `destinations`.
    async fn route_matrix(
        &self,
        origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<RouteLeg>, RoutingError>;
}
