//! Configuration module for finchat.

use serde::Deserialize;
use std::path::Path;

use crate::{FinchatError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins (empty allows any origin).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Token verification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT secret key (must be set).
    #[serde(default)]
    pub jwt_secret: String,
    /// Lifetime of issued tokens in seconds.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,
}

fn default_token_expiry() -> u64 {
    86400 // 24 hours
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_secs: default_token_expiry(),
        }
    }
}

/// Hub and connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Room joined when the upgrade request names none.
    #[serde(default = "default_room")]
    pub default_room: String,
    /// Capacity of each connection's outbound queue.
    #[serde(default = "default_send_buffer")]
    pub send_buffer: usize,
    /// Capacity of the hub's event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Keepalive ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
    /// Read idle timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_room() -> String {
    "general".to_string()
}

fn default_send_buffer() -> usize {
    256
}

fn default_event_buffer() -> usize {
    1024
}

fn default_ping_interval() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    60
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            default_room: default_room(),
            send_buffer: default_send_buffer(),
            event_buffer: default_event_buffer(),
            ping_interval_secs: default_ping_interval(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

/// Message broker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Queue carrying command envelopes to the worker.
    #[serde(default = "default_commands_queue")]
    pub commands_queue: String,
    /// Queue carrying worker replies back to the hub.
    #[serde(default = "default_responses_queue")]
    pub responses_queue: String,
    /// Capacity of each in-process queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_commands_queue() -> String {
    "chat_commands".to_string()
}

fn default_responses_queue() -> String {
    "chat_responses".to_string()
}

fn default_queue_capacity() -> usize {
    1024
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            commands_queue: default_commands_queue(),
            responses_queue: default_responses_queue(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Command worker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Whether the in-process worker is started.
    #[serde(default = "default_bot_enabled")]
    pub enabled: bool,
    /// Market data endpoint.
    #[serde(default = "default_quote_url")]
    pub quote_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_bot_enabled() -> bool {
    true
}

fn default_quote_url() -> String {
    "https://stooq.com/q/l/".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            enabled: default_bot_enabled(),
            quote_url: default_quote_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file (empty for console only).
    #[serde(default)]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Token verification configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Hub configuration.
    #[serde(default)]
    pub hub: HubConfig,
    /// Broker configuration.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Command worker configuration.
    #[serde(default)]
    pub bot: BotConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FinchatError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FinchatError::Config(format!("parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FINCHAT_JWT_SECRET`: Override the JWT secret key
    /// - `FINCHAT_PORT`: Override the HTTP port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("FINCHAT_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.auth.jwt_secret = jwt_secret;
            }
        }

        if let Ok(port) = std::env::var("FINCHAT_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid FINCHAT_PORT value: {}", port),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(FinchatError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via FINCHAT_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.hub.send_buffer == 0 || self.hub.event_buffer == 0 {
            return Err(FinchatError::Config(
                "hub buffers must be greater than zero".to_string(),
            ));
        }
        if self.hub.ping_interval_secs == 0 || self.hub.read_timeout_secs == 0 {
            return Err(FinchatError::Config(
                "hub intervals must be greater than zero".to_string(),
            ));
        }
        if self.broker.queue_capacity == 0 {
            return Err(FinchatError::Config(
                "broker queue_capacity must be greater than zero".to_string(),
            ));
        }
        if self.broker.commands_queue == self.broker.responses_queue {
            return Err(FinchatError::Config(
                "commands_queue and responses_queue must differ".to_string(),
            ));
        }
        Ok(())
    }
}
