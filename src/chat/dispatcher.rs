//! Forwarding of validated commands to the worker.

use std::sync::Arc;

use super::hub::HubHandle;
use super::message::{Message, MessageType};
use crate::broker::Producer;

/// Content of the error message shown when a command cannot be forwarded.
pub const DISPATCH_FAILED_TEXT: &str = "Failed to process command. Please try again later.";

/// Publishes command envelopes to the outbound commands queue.
#[derive(Clone)]
pub struct CommandDispatcher {
    producer: Arc<dyn Producer>,
    hub: HubHandle,
    queue: String,
}

impl CommandDispatcher {
    /// Create a dispatcher publishing to `queue`.
    pub fn new(producer: Arc<dyn Producer>, hub: HubHandle, queue: impl Into<String>) -> Self {
        Self {
            producer,
            hub,
            queue: queue.into(),
        }
    }

    /// Forward a command message to the worker.
    ///
    /// Failures are never retried. They surface as a single `error` message
    /// in the sender's room.
    pub async fn dispatch(&self, message: Message) {
        let room_id = message.room_id.clone();

        let result = match serde_json::to_string(&message) {
            Ok(payload) => self.producer.publish(&self.queue, payload).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => {
                tracing::debug!(
                    "Command {} from {} forwarded to {}",
                    message.content,
                    message.user_id,
                    self.queue
                );
            }
            Err(e) => {
                tracing::warn!("Failed to publish command to {}: {}", self.queue, e);
                let notice = Message::bot(MessageType::Error, room_id, DISPATCH_FAILED_TEXT);
                if self.hub.broadcast(notice).await.is_err() {
                    tracing::warn!("Hub stopped, dropping command failure notice");
                }
            }
        }
    }
}
