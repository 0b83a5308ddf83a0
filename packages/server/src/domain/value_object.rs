//! Value objects.
//!
//! Every identifier and piece of user-supplied text crossing into the core is
//! validated once here, so the rest of the crate can rely on the invariants.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum username length (characters)
pub const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum identifier length for rooms and servers (characters)
pub const MAX_ID_LENGTH: usize = 128;

fn validate(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValueObjectError> {
    if value.trim().is_empty() {
        return Err(ValueObjectError::Empty(field));
    }
    let actual = value.chars().count();
    if actual > max {
        return Err(ValueObjectError::TooLong { field, max, actual });
    }
    Ok(())
}

macro_rules! string_value_object {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                validate($field, &value, $max)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_value_object!(
    /// Authenticated user name, as carried in the session token
    Username,
    "username",
    MAX_USERNAME_LENGTH
);

string_value_object!(
    /// Room identifier; also the Connection Registry key
    RoomId,
    "room_id",
    MAX_ID_LENGTH
);

string_value_object!(
    /// Identifier of the server (owning group) a room belongs to
    ServerId,
    "server_id",
    MAX_ID_LENGTH
);

/// Chat message body.
///
/// Only the empty string is rejected. Whitespace and length are kept as sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::Empty("content"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Server-assigned message id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Opaque identity of one accepted WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
