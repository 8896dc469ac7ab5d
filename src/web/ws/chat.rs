//! Chat WebSocket handler.
//!
//! Authenticates the upgrade request, binds the connection to one room and
//! runs its read and write loops until either side goes away.

use axum::{
    extract::{ws::WebSocket, Query, State, WebSocketUpgrade},
    response::Response,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::auth::{AuthenticatedUser, JwtService};
use crate::chat::{Client, CommandDispatcher, HubHandle};
use crate::config::HubConfig;
use crate::web::error::ApiError;

use super::connection::{read_loop, write_loop};

/// Query parameters for WebSocket connection.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct WsQuery {
    /// Bearer token identifying the user.
    pub token: String,
    /// Room to join (the default room when empty).
    pub room: String,
}

/// Per-connection settings derived from the hub configuration.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Room used when the request names none.
    pub default_room: String,
    /// Outbound queue capacity.
    pub send_buffer: usize,
    /// Idle time before a ping is written.
    pub ping_interval: Duration,
    /// Idle time before the connection is dropped.
    pub read_timeout: Duration,
}

impl From<&HubConfig> for ConnectionSettings {
    fn from(config: &HubConfig) -> Self {
        Self {
            default_room: config.default_room.clone(),
            send_buffer: config.send_buffer,
            ping_interval: Duration::from_secs(config.ping_interval_secs),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
        }
    }
}

/// State for WebSocket chat handler.
#[derive(Clone)]
pub struct ChatWsState {
    /// Token verifier.
    pub jwt: Arc<JwtService>,
    /// Hub handle.
    pub hub: HubHandle,
    /// Command publisher shared by all connections.
    pub dispatcher: CommandDispatcher,
    /// Connection settings.
    pub settings: ConnectionSettings,
}

impl ChatWsState {
    /// Create a new chat WebSocket state.
    pub fn new(
        jwt: Arc<JwtService>,
        hub: HubHandle,
        dispatcher: CommandDispatcher,
        settings: ConnectionSettings,
    ) -> Self {
        Self {
            jwt,
            hub,
            dispatcher,
            settings,
        }
    }
}

/// WebSocket chat handler.
///
/// GET /ws?token={jwt}&room={room}
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ChatWsState>>,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    if query.token.is_empty() {
        return Err(ApiError::unauthorized("token required"));
    }

    let user = state.jwt.verify_token(&query.token).map_err(|e| {
        tracing::debug!("WebSocket connection rejected: {}", e);
        ApiError::unauthorized("invalid token")
    })?;

    let room_id = if query.room.is_empty() {
        state.settings.default_room.clone()
    } else {
        query.room
    };

    tracing::info!(
        "WebSocket connection from user {} ({}) to room {}",
        user.username,
        user.user_id,
        room_id
    );

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user, room_id)))
}

/// Handle a WebSocket connection.
async fn handle_socket(
    socket: WebSocket,
    state: Arc<ChatWsState>,
    user: AuthenticatedUser,
    room_id: String,
) {
    let client = Arc::new(Client::new(
        user.user_id,
        user.username,
        room_id,
        state.hub.clone(),
        state.dispatcher.clone(),
    ));

    let (sender, outbound) = mpsc::channel(state.settings.send_buffer);
    if client.register(sender).await.is_err() {
        tracing::warn!("Hub stopped, rejecting connection of {}", client.user_id());
        return;
    }

    tracing::debug!(
        "WebSocket session {} started for {} in {}",
        client.id(),
        client.username(),
        client.room_id()
    );

    let (ws_sender, ws_receiver) = socket.split();

    let mut write_task = tokio::spawn(write_loop(
        ws_sender,
        outbound,
        state.settings.ping_interval,
    ));
    let mut read_task = tokio::spawn(read_loop(
        ws_receiver,
        client.clone(),
        state.settings.read_timeout,
    ));

    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => write_task.abort(),
    }

    let _ = client.unregister().await;

    tracing::debug!("WebSocket session {} ended", client.id());
}
