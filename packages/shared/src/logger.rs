//! Logging setup utilities for the PingSpace binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Sets up logging for the PingSpace crates and the calling binary.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "pingspace-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use pingspace_shared::logger::setup_logger;
///
/// setup_logger("pingspace-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let binary_target = binary_name.replace('-', "_");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "pingspace_shared={level},pingspace_server={level},pingspace_client={level},{binary}={level},tower_http={level}",
                    level = default_log_level,
                    binary = binary_target,
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
