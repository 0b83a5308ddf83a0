//! Server configuration assembled from the command line and environment.

use std::path::PathBuf;

use chrono::TimeDelta;

use crate::{domain::RateLimitPolicy, infrastructure::identity::JwtConfig};

/// Everything the server needs to start
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitPolicy,
    /// JSON file with servers, members and rooms. Empty directory when unset.
    pub seed_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            jwt: JwtConfig {
                secret: "change-me".to_string(),
                token_ttl: TimeDelta::minutes(60),
            },
            rate_limit: RateLimitPolicy::default(),
            seed_path: None,
        }
    }
}
