//! PingSpace chat fan-out server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin pingspace-server -- --seed packages/server/seed.example.json
//! cargo run --bin pingspace-server -- --host 0.0.0.0 --port 8000 --jwt-secret s3cret
//! cargo run --bin pingspace-server -- --jwt-secret s3cret --issue-token alice
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use chrono::TimeDelta;
use clap::Parser;
use pingspace_server::{
    bootstrap::{build_server, load_directory},
    config::ServerConfig,
    domain::{RateLimitPolicy, Username},
    infrastructure::identity::{JwtConfig, JwtIdentityService},
};
use pingspace_shared::{logger::setup_logger, time::SystemClock};

const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;

#[derive(Parser, Debug)]
#[command(name = "pingspace-server")]
#[command(about = "Real-time chat fan-out server over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "PINGSPACE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PINGSPACE_PORT", default_value = "8000")]
    port: u16,

    /// HMAC secret used to verify (and issue) session tokens
    #[arg(long, env = "PINGSPACE_JWT_SECRET", default_value = "change-me")]
    jwt_secret: String,

    /// Lifetime of issued tokens, in minutes (at most one year)
    #[arg(
        long,
        env = "PINGSPACE_TOKEN_TTL_MINUTES",
        default_value = "60",
        value_parser = clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_MINUTES)
    )]
    token_ttl_minutes: i64,

    /// Maximum messages per user within the rate-limit window
    #[arg(long, env = "PINGSPACE_RATE_LIMIT_MAX", default_value = "10")]
    rate_limit_max: usize,

    /// Length of the rate-limit window, in seconds
    #[arg(long, env = "PINGSPACE_RATE_LIMIT_WINDOW_SECS", default_value = "10")]
    rate_limit_window_secs: u64,

    /// JSON seed file with servers, members and rooms
    #[arg(long, env = "PINGSPACE_SEED")]
    seed: Option<PathBuf>,

    /// Print a signed token for this username and exit
    #[arg(long, value_name = "USERNAME")]
    issue_token: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig, String> {
        let token_ttl = TimeDelta::try_minutes(self.token_ttl_minutes).ok_or_else(|| {
            format!(
                "token TTL of {} minutes is out of range",
                self.token_ttl_minutes
            )
        })?;
        Ok(ServerConfig {
            host: self.host,
            port: self.port,
            jwt: JwtConfig {
                secret: self.jwt_secret,
                token_ttl,
            },
            rate_limit: RateLimitPolicy {
                max_messages: self.rate_limit_max,
                window: Duration::from_secs(self.rate_limit_window_secs),
            },
            seed_path: self.seed,
        })
    }
}

fn issue_token(identity: &JwtIdentityService, username: String) -> Result<String, String> {
    let username = Username::new(username).map_err(|e| e.to_string())?;
    identity.issue_token(&username).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let mut args = Args::parse();
    let issue_for = args.issue_token.take();
    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let identity = Arc::new(JwtIdentityService::new(config.jwt.clone()));

    if let Some(username) = issue_for {
        match issue_token(&identity, username) {
            Ok(token) => {
                println!("{}", token);
                return;
            }
            Err(e) => {
                tracing::error!("Failed to issue token: {}", e);
                std::process::exit(1);
            }
        }
    }

    let directory = match load_directory(&config, Arc::new(SystemClock)) {
        Ok(directory) => Arc::new(directory),
        Err(e) => {
            tracing::error!("Failed to load directory: {}", e);
            std::process::exit(1);
        }
    };

    let server = build_server(&config, directory, identity);
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
