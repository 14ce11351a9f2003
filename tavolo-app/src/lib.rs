pub mod checkout;
pub mod notify;
pub mod state;
pub mod telemetry;

pub use checkout::{CheckoutError, CheckoutOrchestrator, CheckoutRequest};
pub use notify::NotificationDispatcher;
pub use state::AppState;
