//! PingSpace real-time chat fan-out server.
//!
//! Admits authenticated clients into rooms over WebSocket, rate-limits
//! each user's sends, persists every chat message and broadcasts it to
//! the room in commit order.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod bootstrap;
pub mod config;
