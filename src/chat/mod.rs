//! Real-time chat core for finchat.
//!
//! This module provides:
//! - The wire message protocol (chat, join/leave, command, bot, errors)
//! - The hub: room membership and fan-out on a single control loop
//! - Per-connection frame routing
//! - Command forwarding to the worker and re-injection of its replies

mod client;
mod command;
mod dispatcher;
mod hub;
mod message;
mod responses;

pub use client::{Client, INVALID_COMMAND_TEXT};
pub use command::{is_allowed_command, Command, AVAILABLE_COMMANDS};
pub use dispatcher::{CommandDispatcher, DISPATCH_FAILED_TEXT};
pub use hub::{ClientId, Hub, HubClosed, HubHandle, Registration, RoomInfo};
pub use message::{classify, Message, MessageType, ParseError};
pub use responses::{forward_responses, spawn_response_listener, ResponseEnvelope};
