//! Domain entities.

use chrono::{DateTime, Utc};

use super::value_object::{MessageContent, MessageId, RoomId, ServerId, Username};

/// A chat room, owned by exactly one server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub server_id: ServerId,
    pub name: String,
}

impl Room {
    pub fn new(id: RoomId, server_id: ServerId, name: String) -> Self {
        Self {
            id,
            server_id,
            name,
        }
    }
}

/// A chat message accepted by persistence.
///
/// Immutable once created; only persisted messages are ever broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender: Username,
    pub content: MessageContent,
    pub created_at: DateTime<Utc>,
}
