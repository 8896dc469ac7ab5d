//! WebSocket module for real-time chat.

pub mod chat;
pub mod connection;

pub use chat::{chat_ws_handler, ChatWsState, ConnectionSettings, WsQuery};
pub use connection::{read_loop, write_loop};
