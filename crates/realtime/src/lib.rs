//! Interiora Realtime client for Rust
//!
//! The admin console keeps one websocket open per layout mount. The server
//! acknowledges the token and then pushes the number of unread notifications.

mod client;
mod error;
mod message;

pub use client::{ConnectionState, NotificationSocket};
pub use error::RealtimeError;
pub use message::{ClientMessage, ServerMessage};
