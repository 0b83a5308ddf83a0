//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    ConnectParticipantUseCase, DisconnectParticipantUseCase, GetRoomInfoUseCase,
    SendMessageUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（ハンドシェイクと登録）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（切断と退室通知）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendMessageUseCase（Message Pipeline）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// GetRoomInfoUseCase（HTTP API の読み取り）
    pub get_room_info_usecase: Arc<GetRoomInfoUseCase>,
}
