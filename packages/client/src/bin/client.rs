//! PingSpace chat client.
//!
//! Joins one room, prints chat and presence notices, and sends each line
//! typed at the prompt. Reconnects on transport loss (max 5 attempts with a
//! 5 second interval); exits at once if the server rejects the handshake.
//!
//! Run with:
//! ```not_rust
//! TOKEN=$(cargo run --bin pingspace-server -- --issue-token alice)
//! cargo run --bin pingspace-client -- --room general --token "$TOKEN"
//! ```

use clap::Parser;

use pingspace_client::{ClientOptions, run_client};
use pingspace_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "pingspace-client")]
#[command(about = "CLI chat client for PingSpace rooms", long_about = None)]
struct Args {
    /// Room to join
    #[arg(short = 'r', long)]
    room: String,

    /// Session token (JWT)
    #[arg(short = 't', long, env = "PINGSPACE_TOKEN")]
    token: String,

    /// Server base URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8000")]
    url: String,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let options = ClientOptions {
        url: args.url,
        room: args.room,
        token: args.token,
    };
    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
