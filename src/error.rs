//! Error types for finchat.

use thiserror::Error;

/// Common error type for finchat.
#[derive(Error, Debug)]
pub enum FinchatError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Message broker error.
    ///
    /// Raised when a payload cannot be published to, or consumed from, a queue.
    #[error("broker error: {0}")]
    Broker(String),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Command envelope rejected by the worker.
    #[error("command rejected: {0}")]
    Command(#[from] crate::bot::CommandError),

    /// Market data lookup or formatting error.
    #[error("quote error: {0}")]
    Quote(String),
}

/// Result type alias for finchat operations.
pub type Result<T> = std::result::Result<T, FinchatError>;
