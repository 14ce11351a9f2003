pub mod geo;
pub mod models;
pub mod pii;

pub use geo::GeoPoint;
