//! Conversion logic between domain entities and DTOs.

use pingspace_shared::time::to_rfc3339;

use crate::domain::{ChatMessage, Username};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&ChatMessage> for dto::ChatPayload {
    fn from(message: &ChatMessage) -> Self {
        Self {
            sender: message.sender.as_str().to_string(),
            content: message.content.as_str().to_string(),
            created_at: to_rfc3339(message.created_at),
        }
    }
}

impl From<&ChatMessage> for http::MessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.value(),
            room_id: message.room_id.as_str().to_string(),
            payload: message.into(),
        }
    }
}

/// Username list → wire strings
pub fn usernames_to_strings(usernames: Vec<Username>) -> Vec<String> {
    usernames.into_iter().map(Username::into_string).collect()
}
