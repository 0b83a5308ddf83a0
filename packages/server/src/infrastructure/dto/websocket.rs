//! WebSocket payload DTOs.
//!
//! Chat messages travel as a bare `{"sender","content","created_at"}` object;
//! every other server → client payload carries a `type` tag.

use serde::{Deserialize, Serialize};

/// A persisted chat message as broadcast to the room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub sender: String,
    pub content: String,
    /// RFC 3339 timestamp assigned by persistence
    pub created_at: String,
}

/// Tagged notices sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    /// Sent only to the connection that exceeded its send rate
    RateLimit { error: String },
    /// Sent only to the connection whose message could not be handled
    Error { error: String },
    /// A user's first connection in the room was accepted
    UserJoined { username: String, online: Vec<String> },
    /// A user's last connection in the room went away
    UserLeft { username: String, online: Vec<String> },
}

/// Any payload a client may receive
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ServerPayload {
    Notice(Notice),
    Chat(ChatPayload),
}

pub const RATE_LIMIT_MESSAGE: &str = "You're sending messages too fast. Please slow down.";

/// Serialize a payload for the wire
pub fn encode<T: Serialize>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_payload_shape() {
        // テスト項目: チャットメッセージは sender / content / created_at のみを持つ
        // given (前提条件):
        let payload = ChatPayload {
            sender: "U".to_string(),
            content: "hello".to_string(),
            created_at: "2025-01-01T00:00:00.000Z".to_string(),
        };

        // when (操作):
        let json: serde_json::Value = serde_json::from_str(&encode(&payload).unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({
                "sender": "U",
                "content": "hello",
                "created_at": "2025-01-01T00:00:00.000Z"
            })
        );
    }

    #[test]
    fn test_rate_limit_notice_shape() {
        // テスト項目: レート制限通知は type = "rate_limit" と error を持つ
        // given (前提条件):
        let notice = Notice::RateLimit {
            error: RATE_LIMIT_MESSAGE.to_string(),
        };

        // when (操作):
        let json: serde_json::Value = serde_json::from_str(&encode(&notice).unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({ "type": "rate_limit", "error": RATE_LIMIT_MESSAGE })
        );
    }

    #[test]
    fn test_server_payload_distinguishes_chat_and_notices() {
        // テスト項目: 受信側で chat と notice を区別してデコードできる
        // given (前提条件):
        let chat = r#"{"sender":"U","content":"hi","created_at":"T"}"#;
        let joined = r#"{"type":"user_joined","username":"U","online":["U"]}"#;

        // when (操作):
        let chat: ServerPayload = serde_json::from_str(chat).unwrap();
        let joined: ServerPayload = serde_json::from_str(joined).unwrap();

        // then (期待する結果):
        assert!(matches!(chat, ServerPayload::Chat(_)));
        assert_eq!(
            joined,
            ServerPayload::Notice(Notice::UserJoined {
                username: "U".to_string(),
                online: vec!["U".to_string()],
            })
        );
    }
}
