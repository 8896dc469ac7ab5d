//! Command worker: answers command envelopes published by the hub.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use super::quote::{format_quote, QuoteProvider};
use crate::broker::{Producer, Subscription};
use crate::chat::{is_allowed_command, Command, Message, MessageType};
use crate::Result;

/// Reply sent when the market data source cannot be reached.
pub const EXTERNAL_FAILURE_TEXT: &str = "external service failure";

/// Reply sent when the market data cannot be turned into a quote.
pub const INTERNAL_FAILURE_TEXT: &str = "internal error, please try again later";

/// Reason a command envelope was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Envelope has no room.
    #[error("invalid room ID")]
    InvalidRoomId,
    /// Envelope has no sender.
    #[error("invalid user ID")]
    InvalidUserId,
    /// Envelope has no command.
    #[error("invalid command")]
    InvalidCommand,
    /// Command is not one the worker answers.
    #[error("unsupported command")]
    UnsupportedCommand,
}

/// Fields of a command envelope the worker relies on.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommandMessage {
    /// Sender's user ID.
    pub user_id: String,
    /// Room the reply goes to.
    pub room_id: String,
    /// Command token.
    pub content: String,
}

impl CommandMessage {
    /// Check the envelope before doing any lookup.
    pub fn validate(&self) -> std::result::Result<(), CommandError> {
        if self.room_id.is_empty() {
            return Err(CommandError::InvalidRoomId);
        }
        if self.user_id.is_empty() {
            return Err(CommandError::InvalidUserId);
        }
        if self.content.is_empty() {
            return Err(CommandError::InvalidCommand);
        }
        if !is_allowed_command(&self.content) {
            return Err(CommandError::UnsupportedCommand);
        }
        Ok(())
    }
}

/// Resolves commands and publishes replies on the responses queue.
pub struct Worker {
    provider: Arc<dyn QuoteProvider>,
    producer: Arc<dyn Producer>,
    responses_queue: String,
}

impl Worker {
    /// Create a worker.
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        producer: Arc<dyn Producer>,
        responses_queue: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            producer,
            responses_queue: responses_queue.into(),
        }
    }

    /// Handle one command envelope.
    ///
    /// Lookup and formatting failures are reported to the room before the
    /// error is returned.
    pub async fn handle(&self, payload: &str) -> Result<()> {
        let command: CommandMessage = serde_json::from_str(payload)?;
        command.validate()?;

        let parsed = Command::parse(&command.content);
        let csv = match self.provider.fetch_csv(parsed.value()).await {
            Ok(csv) => csv,
            Err(e) => {
                let _ = self.reply(&command.room_id, EXTERNAL_FAILURE_TEXT).await;
                return Err(e);
            }
        };

        match format_quote(&csv) {
            Ok(quote) => self.reply(&command.room_id, &quote).await,
            Err(e) => {
                let _ = self.reply(&command.room_id, INTERNAL_FAILURE_TEXT).await;
                Err(e)
            }
        }
    }

    /// Consume command envelopes until the queue closes.
    pub async fn run(self, mut subscription: Subscription) {
        tracing::info!("Command worker consuming {}", subscription.queue());
        while let Some(payload) = subscription.next().await {
            if let Err(e) = self.handle(&payload).await {
                tracing::warn!("Failed to handle command: {}", e);
            }
        }
        tracing::info!("Command queue {} closed", subscription.queue());
    }

    async fn reply(&self, room_id: &str, content: &str) -> Result<()> {
        let payload = serde_json::to_string(&Message::bot(MessageType::Bot, room_id, content))?;
        tracing::debug!("Publishing reply for room {}", room_id);
        self.producer
            .publish(&self.responses_queue, payload)
            .await
            .inspect_err(|e| tracing::warn!("Failed to publish reply: {}", e))
    }
}
