//! Router configuration for the HTTP surface.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{health_check, list_rooms};
use super::middleware::create_cors_layer;
use super::ws::{chat_ws_handler, ChatWsState};

/// Create the main router.
///
/// Serves the chat WebSocket at `/ws` and the room listing at `/api/rooms`.
pub fn create_router(state: Arc<ChatWsState>, cors_origins: &[String]) -> Router {
    let ws_routes = Router::new()
        .route("/ws", get(chat_ws_handler))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/rooms", get(list_rooms))
        .with_state(state.hub.clone());

    Router::new()
        .merge(ws_routes)
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}
