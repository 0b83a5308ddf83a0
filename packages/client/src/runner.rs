//! Client execution logic with reconnection support.

use std::time::Duration;

use super::{
    domain::{should_attempt_reconnect, should_exit_immediately},
    error::ClientError,
    session::{room_url, run_client_session},
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Where and as whom to connect
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Server base URL, e.g. `ws://127.0.0.1:8000`
    pub url: String,
    pub room: String,
    pub token: String,
}

/// Run the WebSocket client with reconnection logic
///
/// Handshake rejections end the client at once; transport failures are
/// retried up to `MAX_RECONNECT_ATTEMPTS` times.
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    let url = room_url(&options.url, &options.room, &options.token)?;
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} room '{}' (attempt {}/{})",
            options.url,
            options.room,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        let error = match run_client_session(&url, &options.room).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => e,
        };

        if should_exit_immediately(&error) {
            tracing::error!("{}", error);
            return Err(error);
        }

        tracing::warn!("Connection lost: {}", error);
        reconnect_count += 1;

        if !should_attempt_reconnect(&error, reconnect_count, MAX_RECONNECT_ATTEMPTS) {
            tracing::error!(
                "Failed to reconnect after {} attempts. Exiting.",
                MAX_RECONNECT_ATTEMPTS
            );
            return Err(error);
        }

        tracing::info!(
            "Reconnecting in {} seconds... (attempt {}/{})",
            RECONNECT_INTERVAL_SECS,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
    }
}
