//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::ChatPayload;

/// `GET /api/rooms/{room_id}/online`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineUsersDto {
    pub room_id: String,
    pub online: Vec<String>,
}

/// One entry of `GET /api/rooms/{room_id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: u64,
    pub room_id: String,
    #[serde(flatten)]
    pub payload: ChatPayload,
}

/// Error body for HTTP failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub detail: String,
}
