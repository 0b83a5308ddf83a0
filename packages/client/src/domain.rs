//! Domain logic for client-side operations.
//!
//! Pure functions deciding how the client reacts to a failed session.

use crate::error::ClientError;

/// Close codes the server uses to refuse a handshake. Retrying with the
/// same token and room cannot succeed.
const HANDSHAKE_REJECTION_CODES: [u16; 3] = [1008, 4403, 4404];

/// Map a close frame received from the server to a client error.
pub fn classify_close(code: u16, reason: &str) -> ClientError {
    if HANDSHAKE_REJECTION_CODES.contains(&code) {
        ClientError::Rejected {
            code,
            reason: reason.to_string(),
        }
    } else {
        ClientError::ConnectionError(format!("closed by server ({}): {}", code, reason))
    }
}

/// Check if the client should exit immediately based on the error type.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::Rejected { .. })
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}
