//! UseCase layer: orchestration of the domain interfaces.
//!
//! - `admission`: Token Validator and Room Access Gate
//! - `connect_participant` / `disconnect_participant`: registry lifecycle
//! - `broadcast`: Broadcast Engine
//! - `send_message`: Message Pipeline
//! - `get_room_info`: read-only room queries for the HTTP API

pub mod admission;
pub mod broadcast;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod get_room_info;
pub mod send_message;

pub use admission::{Admission, RoomAccessGate, TokenValidator};
pub use broadcast::{BroadcastEngine, BroadcastReport};
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, SendMessageError};
pub use get_room_info::GetRoomInfoUseCase;
pub use send_message::SendMessageUseCase;
