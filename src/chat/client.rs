//! Per-connection identity and inbound frame routing.

use tokio::sync::mpsc;
use uuid::Uuid;

use super::command::is_allowed_command;
use super::dispatcher::CommandDispatcher;
use super::hub::{ClientId, HubClosed, HubHandle, Registration};
use super::message::{classify, Message, MessageType};

/// Content of the notice sent back when a command is not supported.
pub const INVALID_COMMAND_TEXT: &str = "Invalid command. Verify and try again.";

/// One authenticated session bound to a single room.
pub struct Client {
    id: ClientId,
    user_id: String,
    username: String,
    room_id: String,
    hub: HubHandle,
    dispatcher: CommandDispatcher,
}

impl Client {
    /// Create a client with a fresh connection ID.
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        room_id: impl Into<String>,
        hub: HubHandle,
        dispatcher: CommandDispatcher,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            username: username.into(),
            room_id: room_id.into(),
            hub,
            dispatcher,
        }
    }

    /// Connection ID.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Authenticated user ID.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Display name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Room this client belongs to.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Admit this client into its room with the given outbound queue.
    pub async fn register(&self, sender: mpsc::Sender<String>) -> Result<(), HubClosed> {
        self.hub
            .register(Registration {
                client_id: self.id,
                user_id: self.user_id.clone(),
                username: self.username.clone(),
                room_id: self.room_id.clone(),
                sender,
            })
            .await
    }

    /// Remove this client from its room. Safe to call more than once.
    pub async fn unregister(&self) -> Result<(), HubClosed> {
        self.hub.unregister(self.id, self.room_id.clone()).await
    }

    /// Route one inbound frame.
    ///
    /// Malformed frames are logged and skipped. The sender's identity and
    /// room always replace whatever the frame claims. Only a stopped hub is
    /// reported as an error.
    pub async fn handle_frame(&self, raw: &[u8]) -> Result<(), HubClosed> {
        let mut message = match classify(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Dropping frame from {}: {}", self.user_id, e);
                return Ok(());
            }
        };

        message.user_id = self.user_id.clone();
        message.username = self.username.clone();
        message.room_id = self.room_id.clone();

        match message.kind {
            MessageType::Command => {
                if is_allowed_command(&message.content) {
                    self.dispatcher.dispatch(message).await;
                } else {
                    tracing::debug!(
                        "Rejected command {:?} from {}",
                        message.content,
                        self.user_id
                    );
                    let notice =
                        Message::bot(MessageType::Invalid, &self.room_id, INVALID_COMMAND_TEXT);
                    self.hub.broadcast(notice).await?;
                }
            }
            MessageType::Chat
            | MessageType::UserJoined
            | MessageType::UserLeft
            | MessageType::Bot
            | MessageType::Invalid
            | MessageType::Error => {
                self.hub.broadcast(message).await?;
            }
        }

        Ok(())
    }
}
