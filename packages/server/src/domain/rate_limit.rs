//! Send-rate admission control.

use std::time::Duration;

use super::Username;

/// Sliding-window policy applied to every username
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_messages: usize,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_messages: 10,
            window: Duration::from_secs(10),
        }
    }
}

/// Per-username admission check.
///
/// `can_send` must be atomic per username: a user with several open
/// connections may hit it concurrently.
pub trait RateLimiter: Send + Sync {
    /// Record a send and return `true` if fewer than `max_messages` sends
    /// happened within the trailing `window`; otherwise return `false`
    /// without recording anything.
    fn can_send(&self, username: &Username, max_messages: usize, window: Duration) -> bool;
}
