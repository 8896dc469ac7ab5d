//! Read and write loops of a WebSocket connection.
//!
//! Each connection runs exactly one of each. The write loop is the only
//! writer to the socket; the read loop is the only reader.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message as WsMessage;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant};

use crate::chat::Client;

/// Drain the outbound queue onto the socket.
///
/// A ping is written whenever `ping_interval` passes without outbound
/// traffic. Returns when the queue is closed (after sending a close frame)
/// or when a write fails.
pub async fn write_loop<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<String>,
    ping_interval: Duration,
) where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    let mut ticker = interval_at(Instant::now() + ping_interval, ping_interval);

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(e) = sink.send(WsMessage::Text(text)).await {
                        tracing::debug!("WebSocket write failed: {}", e);
                        return;
                    }
                    ticker.reset();
                }
                None => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    return;
                }
            },
            _ = ticker.tick() => {
                if let Err(e) = sink.send(WsMessage::Ping(Vec::new())).await {
                    tracing::debug!("WebSocket ping failed: {}", e);
                    return;
                }
            }
        }
    }
}

/// Feed inbound frames to the client until the peer goes away.
///
/// Any frame, including a pong, refreshes the idle deadline. Returns on
/// close, transport error, idle timeout, or when the hub has stopped.
pub async fn read_loop<S, E>(mut stream: S, client: Arc<Client>, read_timeout: Duration)
where
    S: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: Display,
{
    loop {
        let frame = match timeout(read_timeout, stream.next()).await {
            Err(_) => {
                tracing::info!(
                    "Closing idle connection of {} in {}",
                    client.username(),
                    client.room_id()
                );
                return;
            }
            Ok(None) => return,
            Ok(Some(Err(e))) => {
                tracing::debug!("WebSocket error: {}", e);
                return;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        let delivered = match frame {
            WsMessage::Text(text) => client.handle_frame(text.as_bytes()).await,
            WsMessage::Binary(data) => client.handle_frame(&data).await,
            WsMessage::Close(_) => {
                tracing::debug!("WebSocket closed by client {}", client.user_id());
                return;
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) => Ok(()),
        };

        if delivered.is_err() {
            tracing::warn!("Hub stopped, closing connection of {}", client.user_id());
            return;
        }
    }
}
