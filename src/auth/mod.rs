//! Authentication for finchat.
//!
//! Users are registered elsewhere; this service only verifies the bearer
//! tokens presented at WebSocket handshake time.

mod jwt;

pub use jwt::{AuthenticatedUser, Claims, JwtService};
