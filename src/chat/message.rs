//! Wire message protocol shared by connections, the hub and the broker.
//!
//! Every frame on the wire is a JSON object of the form
//! `{type, user_id, username, room_id, content, timestamp}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type of chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Regular chat message.
    #[serde(rename = "default")]
    Chat,
    /// User joined notification.
    UserJoined,
    /// User left notification.
    UserLeft,
    /// Command forwarded to the worker.
    Command,
    /// Reply produced by the worker.
    Bot,
    /// Rejected command.
    Invalid,
    /// Command could not be processed.
    Error,
}

impl MessageType {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Chat => "default",
            MessageType::UserJoined => "user_joined",
            MessageType::UserLeft => "user_left",
            MessageType::Command => "command",
            MessageType::Bot => "bot",
            MessageType::Invalid => "invalid",
            MessageType::Error => "error",
        }
    }

    /// Parse a type tag, ignoring ASCII case.
    ///
    /// An empty tag is a chat message.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.to_ascii_lowercase();
        match tag.as_str() {
            "" | "default" => Some(MessageType::Chat),
            "user_joined" => Some(MessageType::UserJoined),
            "user_left" => Some(MessageType::UserLeft),
            "command" => Some(MessageType::Command),
            "bot" => Some(MessageType::Bot),
            "invalid" => Some(MessageType::Invalid),
            "error" => Some(MessageType::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error produced when an inbound frame cannot be classified.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Frame is not a JSON object of the expected shape.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    /// Frame carries a type tag outside the protocol.
    #[error("unknown message type: {0}")]
    UnknownType(String),
}

/// Permissive decoding target: missing fields decode to empty values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: String,
    user_id: String,
    username: String,
    room_id: String,
    content: String,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message type.
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Sender's user ID (empty for bot messages).
    pub user_id: String,
    /// Sender's display name (empty for bot messages).
    pub username: String,
    /// Target room.
    pub room_id: String,
    /// Message content.
    pub content: String,
    /// Seconds since the epoch at construction.
    pub timestamp: i64,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(
        kind: MessageType,
        user_id: impl Into<String>,
        username: impl Into<String>,
        room_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            user_id: user_id.into(),
            username: username.into(),
            room_id: room_id.into(),
            content: content.into(),
            timestamp: now(),
        }
    }

    /// Create a regular chat message.
    pub fn chat(
        user_id: impl Into<String>,
        username: impl Into<String>,
        room_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(MessageType::Chat, user_id, username, room_id, content)
    }

    /// Create a join notification.
    pub fn user_joined(
        user_id: impl Into<String>,
        username: impl Into<String>,
        room_id: impl Into<String>,
    ) -> Self {
        let username = username.into();
        let content = format!("{username} joined the room");
        Self::new(MessageType::UserJoined, user_id, username, room_id, content)
    }

    /// Create a leave notification.
    pub fn user_left(
        user_id: impl Into<String>,
        username: impl Into<String>,
        room_id: impl Into<String>,
    ) -> Self {
        let username = username.into();
        let content = format!("{username} left the room");
        Self::new(MessageType::UserLeft, user_id, username, room_id, content)
    }

    /// Create a message from the bot identity.
    pub fn bot(kind: MessageType, room_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(kind, "", "", room_id, content)
    }

    /// Whether the message was originated by the bot rather than a user.
    pub fn is_from_bot(&self) -> bool {
        self.user_id.is_empty() && self.username.is_empty()
    }
}

/// Current time in seconds since the epoch.
fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Classify a raw inbound frame.
///
/// Decoding is permissive: unknown fields are ignored and missing fields
/// decode to empty strings. The timestamp is always assigned here, never
/// taken from the sender.
pub fn classify(raw: &[u8]) -> Result<Message, ParseError> {
    let raw: RawMessage = serde_json::from_slice(raw)?;
    let kind = MessageType::parse(&raw.kind).ok_or(ParseError::UnknownType(raw.kind))?;

    Ok(Message::new(
        kind,
        raw.user_id,
        raw.username,
        raw.room_id,
        raw.content,
    ))
}
