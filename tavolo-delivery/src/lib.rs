pub mod estimator;
pub mod models;

pub use estimator::{DeliveryEstimator, MockRoutingAdapter, QuoteError};
pub use models::DeliveryQuote;
