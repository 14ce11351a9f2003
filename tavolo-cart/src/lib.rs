pub mod engine;
pub mod models;

pub use engine::{CartError, SessionCart};
pub use models::{CartLine, CartSnapshot, Customization};
