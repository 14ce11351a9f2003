use serde::{Deserialize, Serialize};
use tavolo_core::directory::FulfillmentType;

/// The computed cost/time envelope for a candidate order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub fulfillment: FulfillmentType,
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub fee_cents: i32,
}

impl DeliveryQuote {
    /// Pickup orders never route: the quote degenerates to zero distance and fee
    pub fn pickup() -> Self {
        Self {
            fulfillment: FulfillmentType::Pickup,
            distance_km: 0.0,
            duration_minutes: 0,
            fee_cents: 0,
        }
    }

    pub fn is_pickup(&self) -> bool {
        self.fulfillment == FulfillmentType::Pickup
    }
}
