//! Domain error types.

use thiserror::Error;

use super::connection::ConnectionState;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} exceeds {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

/// Identity Service errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Signature, expiry or claim check failed
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token could not be produced
    #[error("Token issuance failed: {0}")]
    IssueFailed(String),
}

/// Membership Service errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    #[error("Membership directory unavailable: {0}")]
    Unavailable(String),
}

/// Persistence Service errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("Failed to store message: {0}")]
    StoreFailed(String),

    #[error("Failed to load messages: {0}")]
    LoadFailed(String),
}

/// A frame could not be handed to the connection's socket writer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Connection '{0}' is no longer writable")]
pub struct TransportError(pub String);

/// Illegal connection lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Illegal connection transition: {from:?} -> {to:?}")]
pub struct ConnectionStateError {
    pub from: ConnectionState,
    pub to: ConnectionState,
}
