//! WebSocket connection handlers.
//!
//! The upgrade is always accepted. Admission runs on the upgraded socket so
//! that every rejection reaches the client as a close frame with a specific
//! code instead of a bare HTTP error.

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{
        ConnectionHandle, ConnectionId, ConnectionState, OutboundFrame, PusherQueue,
        pusher_channel,
    },
    ui::state::AppState,
    usecase::ConnectError,
};

/// Close code for a room that does not exist
pub const ROOM_NOT_FOUND: u16 = 4404;
/// Close code for a caller outside the room's owning server
pub const NOT_A_MEMBER: u16 = 4403;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id, query.token))
}

/// Close code and reason sent for each handshake failure
pub fn close_code_for(err: &ConnectError) -> (u16, &'static str) {
    match err {
        ConnectError::InvalidToken(_) => (close_code::POLICY, "Invalid token"),
        ConnectError::RoomNotFound(_) => (ROOM_NOT_FOUND, "Room not found"),
        ConnectError::NotAMember => (NOT_A_MEMBER, "Not a member of this server"),
        ConnectError::Unavailable(_) => (close_code::ERROR, "Service unavailable"),
    }
}

/// Lifecycle bookkeeping for one socket
struct Session {
    connection_id: Option<ConnectionId>,
    state: ConnectionState,
}

impl Session {
    fn new() -> Self {
        Self {
            connection_id: None,
            state: ConnectionState::Pending,
        }
    }

    fn advance(&mut self, next: ConnectionState) {
        match self.state.transition(next) {
            Ok(state) => self.state = state,
            Err(err) => tracing::error!(
                connection_id = ?self.connection_id,
                error = %err,
                "Illegal connection state transition"
            ),
        }
    }
}

/// Forwards queued frames to the socket. Ends after a close frame, when every
/// handle is dropped, when the socket stops accepting writes, or when the
/// handle's shutdown token is cancelled (even mid-write to a peer that never
/// reads).
fn pusher_loop(
    mut rx: PusherQueue,
    mut sender: SplitSink<WebSocket, Message>,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                _ = shutdown.cancelled() => break,
                frame = rx.recv() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };
            match frame {
                OutboundFrame::Text(payload) => {
                    let sent = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        result = sender.send(Message::Text(payload.into())) => result,
                    };
                    if sent.is_err() {
                        break;
                    }
                }
                OutboundFrame::Close { code, reason } => {
                    let _ = sender
                        .send(Message::Close(Some(CloseFrame {
                            code,
                            reason: reason.into(),
                        })))
                        .await;
                    break;
                }
            }
        }
        // Dropping the receiver makes every later push through a handle fail
        rx.close();
    })
}

async fn reject(mut socket: WebSocket, err: &ConnectError) {
    let (code, reason) = close_code_for(err);
    let frame = CloseFrame {
        code,
        reason: reason.into(),
    };
    if let Err(send_err) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!("Failed to send rejection close frame: {}", send_err);
    }
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    room_id: String,
    token: Option<String>,
) {
    let mut session = Session::new();

    let admission = match state
        .connect_participant_usecase
        .admit(token.as_deref(), &room_id)
        .await
    {
        Ok(admission) => admission,
        Err(err) => {
            tracing::warn!(room_id = %room_id, error = %err, "Handshake rejected");
            reject(socket, &err).await;
            session.advance(ConnectionState::Removed);
            return;
        }
    };
    session.advance(ConnectionState::Authorized);

    let (sender, mut receiver) = socket.split();
    let (tx, rx) = pusher_channel();
    let handle = ConnectionHandle::new(tx);
    let connection_id = handle.id();
    session.connection_id = Some(connection_id);

    // Start the writer first so the join notice is flushed as soon as it is queued
    let mut send_task = pusher_loop(rx, sender, handle.shutdown_token());

    state
        .connect_participant_usecase
        .register(&admission, handle.clone())
        .await;
    session.advance(ConnectionState::Accepted);

    let room = admission.room_id.clone();
    let username = admission.username.clone();
    let state_clone = state.clone();

    // Frames from one connection are handled strictly in receipt order
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, "WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    if let Err(err) = state_clone
                        .send_message_usecase
                        .execute(&room, &username, &handle, text.to_string())
                        .await
                    {
                        tracing::debug!(
                            connection_id = %connection_id,
                            error = %err,
                            "Message dropped"
                        );
                    }
                }
                Message::Binary(_) => {
                    tracing::debug!(connection_id = %connection_id, "Ignoring binary frame");
                }
                Message::Close(_) => {
                    tracing::info!(connection_id = %connection_id, "Client requested close");
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => {},
        _ = &mut send_task => {},
    };
    session.advance(ConnectionState::Closing);

    // Unregister before stopping the writer, otherwise a concurrent broadcast
    // could prune the connection first and the departure would go unannounced
    state
        .disconnect_participant_usecase
        .execute(&admission.room_id, &connection_id)
        .await;
    recv_task.abort();
    send_task.abort();
    session.advance(ConnectionState::Removed);
}
