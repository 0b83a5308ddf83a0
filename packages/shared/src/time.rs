//! Time-related utilities with clock abstraction for testability.

use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given instant
    pub fn new(fixed_time: DateTime<Utc>) -> Self {
        Self { fixed_time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.fixed_time
    }
}

/// Clock that only moves when told to.
///
/// Used to drive sliding windows across their boundary without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: TimeDelta) {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *current += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Format an instant as RFC 3339 (ISO-8601) in UTC with millisecond precision.
///
/// e.g. `2025-11-27T12:30:00.250Z`
pub fn to_rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
