//! Message formatting utilities for client display.

use chrono::{DateTime, Local};
use pingspace_server::infrastructure::dto::websocket::{ChatPayload, Notice, ServerPayload};

const RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format any payload received from the server
    pub fn format_payload(payload: &ServerPayload) -> String {
        match payload {
            ServerPayload::Chat(chat) => Self::format_chat_message(chat),
            ServerPayload::Notice(Notice::UserJoined { username, online }) => {
                Self::format_user_joined(username, online)
            }
            ServerPayload::Notice(Notice::UserLeft { username, online }) => {
                Self::format_user_left(username, online)
            }
            ServerPayload::Notice(Notice::RateLimit { error }) => Self::format_rate_limit(error),
            ServerPayload::Notice(Notice::Error { error }) => Self::format_error(error),
        }
    }

    /// Format a chat message
    ///
    /// `created_at` is shown in local time when it parses as RFC 3339,
    /// verbatim otherwise.
    pub fn format_chat_message(chat: &ChatPayload) -> String {
        format!(
            "\n\n{rule}\n@{}: {}\nsent at {}\n{rule}\n",
            chat.sender,
            chat.content,
            Self::local_time(&chat.created_at),
            rule = RULE,
        )
    }

    /// Format a user-joined notification
    pub fn format_user_joined(username: &str, online: &[String]) -> String {
        format!("\n+ {} joined (online: {})\n", username, online.join(", "))
    }

    /// Format a user-left notification
    pub fn format_user_left(username: &str, online: &[String]) -> String {
        if online.is_empty() {
            format!("\n- {} left (nobody else online)\n", username)
        } else {
            format!("\n- {} left (online: {})\n", username, online.join(", "))
        }
    }

    /// Format a rate-limit notice
    pub fn format_rate_limit(error: &str) -> String {
        format!("\n! {}\n", error)
    }

    /// Format an error notice
    pub fn format_error(error: &str) -> String {
        format!("\n! error: {}\n", error)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }

    fn local_time(created_at: &str) -> String {
        DateTime::parse_from_rfc3339(created_at)
            .map(|instant| {
                instant
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|_| created_at.to_string())
    }
}
