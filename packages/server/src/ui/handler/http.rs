//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};

use crate::{
    infrastructure::dto::{
        conversion::usernames_to_strings,
        http::{ErrorDto, MessageDto, OnlineUsersDto},
    },
    ui::state::AppState,
    usecase::ConnectError,
};

/// Authorization failures rendered with the same taxonomy as the handshake
pub struct ApiError(ConnectError);

impl From<ConnectError> for ApiError {
    fn from(err: ConnectError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ConnectError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            ConnectError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            ConnectError::NotAMember => StatusCode::FORBIDDEN,
            ConnectError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = ErrorDto {
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Service banner
pub async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "pingspace",
        "websocket": "/ws/{room_id}?token=<token>"
    }))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Usernames currently connected to a room
pub async fn get_online_users(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<OnlineUsersDto>, ApiError> {
    let (room_id, online) = state
        .get_room_info_usecase
        .online(bearer_token(&headers), &room_id)
        .await?;

    // Domain Model から DTO への変換
    Ok(Json(OnlineUsersDto {
        room_id: room_id.into_string(),
        online: usernames_to_strings(online),
    }))
}

/// Persisted history of a room, oldest first
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let messages = state
        .get_room_info_usecase
        .history(bearer_token(&headers), &room_id)
        .await?;

    Ok(Json(messages.iter().map(MessageDto::from).collect()))
}
