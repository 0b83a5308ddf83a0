//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use pingspace_server::infrastructure::dto::websocket::ServerPayload;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use crate::{domain::classify_close, error::ClientError};

use super::{
    formatter::MessageFormatter,
    ui::{prompt, redisplay_prompt},
};

/// Build `{base}/ws/{room}?token={token}` with the room and token encoded
pub fn room_url(base: &str, room: &str, token: &str) -> Result<Url, ClientError> {
    let mut url =
        Url::parse(base).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidUrl(format!("{}: cannot be a base", base)))?
        .pop_if_empty()
        .extend(["ws", room]);
    url.query_pairs_mut().clear().append_pair("token", token);
    Ok(url)
}

/// Run one WebSocket session until the user quits or the connection ends
pub async fn run_client_session(url: &Url, room: &str) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(url.as_str())
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to room '{}'", room);
    println!(
        "\nYou are in #{}. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
        room
    );

    let (mut write, mut read) = ws_stream.split();

    let room_for_read = room.to_string();

    // Spawn a task to handle incoming messages
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let formatted = match serde_json::from_str::<ServerPayload>(text.as_str()) {
                        Ok(payload) => MessageFormatter::format_payload(&payload),
                        Err(_) => MessageFormatter::format_raw_message(text.as_str()),
                    };
                    print!("{}", formatted);
                    redisplay_prompt(&room_for_read);
                }
                Ok(Message::Close(frame)) => {
                    let error = match frame {
                        Some(frame) => classify_close(u16::from(frame.code), frame.reason.as_str()),
                        None => ClientError::ConnectionError("Connection closed".to_string()),
                    };
                    tracing::info!("Server closed the connection: {}", error);
                    return error;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return ClientError::ConnectionError(e.to_string());
                }
                _ => {}
            }
        }

        ClientError::ConnectionError("Connection lost".to_string())
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt = prompt(room);
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to forward input lines to the server as text frames
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            if let Err(e) = write.send(Message::Text(line.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                return Err(ClientError::ConnectionError(e.to_string()));
            }
        }

        // Input ended: leave politely
        let _ = write.send(Message::Close(None)).await;
        Ok(())
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            match read_result {
                Ok(error) => Err(error),
                Err(e) => Err(ClientError::ConnectionError(e.to_string())),
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            match write_result {
                Ok(result) => result,
                Err(e) => Err(ClientError::ConnectionError(e.to_string())),
            }
        }
    }
}
