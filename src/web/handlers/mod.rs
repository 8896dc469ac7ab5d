//! HTTP handlers.

pub mod health;
pub mod rooms;

pub use health::{health_check, HealthResponse};
pub use rooms::list_rooms;
