//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The server refused the handshake (bad token, unknown room, not a member)
    #[error("Rejected by server ({code}): {reason}")]
    Rejected { code: u16, reason: String },

    /// The server URL cannot be turned into a room URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
