//! Axum handlers.

mod http;
mod websocket;

pub use http::{get_messages, get_online_users, health_check, index};
pub use websocket::websocket_handler;
