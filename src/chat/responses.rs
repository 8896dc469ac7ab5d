//! Re-injection of worker replies into room broadcasts.
//!
//! Replies carry no correlation with the command that caused them; they are
//! addressed purely by room. A command the worker never answers simply
//! produces nothing.

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use super::hub::HubHandle;
use super::message::{Message, MessageType};
use crate::broker::{Consumer, Subscription};
use crate::Result;

/// Reply published by the worker on the responses queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseEnvelope {
    /// Room the reply is addressed to.
    pub room_id: String,
    /// Reply text.
    pub content: String,
}

impl ResponseEnvelope {
    /// Turn the reply into a bot message for its room.
    pub fn into_message(self) -> Message {
        Message::bot(MessageType::Bot, self.room_id, self.content)
    }
}

/// Subscribe to `queue` and forward every reply to the hub on a new task.
///
/// The subscription is made before this returns, so a broker that refuses
/// it is reported to the caller.
pub async fn spawn_response_listener(
    consumer: &dyn Consumer,
    queue: &str,
    hub: HubHandle,
) -> Result<JoinHandle<()>> {
    let subscription = consumer.subscribe(queue).await?;
    tracing::info!("Listening for worker replies on {}", queue);
    Ok(tokio::spawn(forward_responses(subscription, hub)))
}

/// Forward replies until the queue closes or the hub stops.
pub async fn forward_responses(mut subscription: Subscription, hub: HubHandle) {
    while let Some(payload) = subscription.next().await {
        let envelope: ResponseEnvelope = match serde_json::from_str(&payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Dropping malformed reply from {}: {}", subscription.queue(), e);
                continue;
            }
        };

        if envelope.room_id.is_empty() {
            tracing::warn!("Dropping reply without room_id");
            continue;
        }

        tracing::debug!("Worker reply for room {}", envelope.room_id);
        if hub.broadcast(envelope.into_message()).await.is_err() {
            tracing::warn!("Hub stopped, no longer forwarding worker replies");
            return;
        }
    }
    tracing::info!("Reply queue {} closed", subscription.queue());
}
