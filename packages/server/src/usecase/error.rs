//! UseCase error types.

use thiserror::Error;

use crate::domain::{IdentityError, MembershipError, PersistenceError};

/// Handshake-time failures. All of them fail closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    #[error("Not a member of this server")]
    NotAMember,

    #[error("Membership directory unavailable: {0}")]
    Unavailable(String),
}

impl From<IdentityError> for ConnectError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidToken(reason) => ConnectError::InvalidToken(reason),
            IdentityError::IssueFailed(reason) => ConnectError::InvalidToken(reason),
        }
    }
}

impl From<MembershipError> for ConnectError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::RoomNotFound(room_id) => ConnectError::RoomNotFound(room_id),
            MembershipError::Unavailable(reason) => ConnectError::Unavailable(reason),
        }
    }
}

/// Per-message failures. Scoped to one message and its sender.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid message: {0}")]
    InvalidContent(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Failed to encode payload: {0}")]
    Encode(String),
}
