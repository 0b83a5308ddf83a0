//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::{
    ConnectParticipantUseCase, DisconnectParticipantUseCase, GetRoomInfoUseCase,
    SendMessageUseCase,
};

use super::{
    handler::{get_messages, get_online_users, health_check, index, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Chat fan-out server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     connect_participant_usecase,
///     disconnect_participant_usecase,
///     send_message_usecase,
///     get_room_info_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 8000).await?;
/// ```
pub struct Server {
    connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    send_message_usecase: Arc<SendMessageUseCase>,
    get_room_info_usecase: Arc<GetRoomInfoUseCase>,
}

impl Server {
    pub fn new(
        connect_participant_usecase: Arc<ConnectParticipantUseCase>,
        disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
        get_room_info_usecase: Arc<GetRoomInfoUseCase>,
    ) -> Self {
        Self {
            connect_participant_usecase,
            disconnect_participant_usecase,
            send_message_usecase,
            get_room_info_usecase,
        }
    }

    /// Build the router without binding a socket
    pub fn into_router(self) -> Router {
        let app_state = Arc::new(AppState {
            connect_participant_usecase: self.connect_participant_usecase,
            disconnect_participant_usecase: self.disconnect_participant_usecase,
            send_message_usecase: self.send_message_usecase,
            get_room_info_usecase: self.get_room_info_usecase,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws/{room_id}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/", get(index))
            .route("/health", get(health_check))
            .route("/api/rooms/{room_id}/online", get(get_online_users))
            .route("/api/rooms/{room_id}/messages", get(get_messages))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Bind to `host:port` and serve until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(
        self,
        host: String,
        port: u16,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;
        self.run_with_listener(listener).await
    }

    /// Serve on an already bound listener (port 0 in tests)
    pub async fn run_with_listener(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let local_addr = listener.local_addr()?;
        let app = self.into_router();

        tracing::info!("Chat server listening on {}", local_addr);
        tracing::info!("Connect to: ws://{}/ws/{{room_id}}?token=<token>", local_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
