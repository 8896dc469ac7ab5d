//! HTTP and WebSocket surface.
//!
//! Exposes the chat endpoint (`/ws`), the room listing (`/api/rooms`) and a
//! health check (`/health`).

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod ws;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
pub use ws::ChatWsState;
