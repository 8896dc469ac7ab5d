//! finchat - real-time chat rooms with a market data command bot
//!
//! Authenticated WebSocket connections join rooms managed by a single hub
//! task. Slash commands are handed to a worker over a message broker and
//! its replies are broadcast back into the originating room.

pub mod app;
pub mod auth;
pub mod bot;
pub mod broker;
pub mod chat;
pub mod config;
pub mod error;
pub mod logging;
pub mod web;

pub use app::Application;
pub use auth::{AuthenticatedUser, Claims, JwtService};
pub use broker::{Consumer, MemoryBroker, Producer, Subscription};
pub use chat::{Hub, HubHandle, Message, MessageType, RoomInfo};
pub use config::Config;
pub use error::{FinchatError, Result};
pub use web::WebServer;
