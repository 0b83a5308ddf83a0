//! Directory seed data loaded from JSON.
//!
//! ```json
//! {
//!   "servers": [{ "id": "s1", "members": ["alice", "bob"] }],
//!   "rooms": [{ "id": "general", "server_id": "s1", "name": "general" }]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{RoomId, ServerId, Username};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse seed data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Room '{room}' refers to unknown server '{server}'")]
    UnknownServer { room: String, server: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub servers: Vec<SeedServer>,
    #[serde(default)]
    pub rooms: Vec<SeedRoom>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedServer {
    pub id: ServerId,
    #[serde(default)]
    pub members: Vec<Username>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedRoom {
    pub id: RoomId,
    pub server_id: ServerId,
    #[serde(default)]
    pub name: String,
}

impl SeedData {
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        let data: SeedData = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let json = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), SeedError> {
        for room in &self.rooms {
            if !self.servers.iter().any(|server| server.id == room.server_id) {
                return Err(SeedError::UnknownServer {
                    room: room.id.to_string(),
                    server: room.server_id.to_string(),
                });
            }
        }
        Ok(())
    }
}
