//! InMemory directory 実装
//!
//! ルーム・サーバー・メンバーシップ・メッセージを保持するインメモリストア。
//! `MembershipService` と `MessageRepository` の両方を実装します。
//!
//! ## 技術的負債
//!
//! プロセス再起動でメッセージは失われます。永続化が必要になった時点で
//! RDB 実装に差し替える前提で、trait 境界の外には何も漏らしていません。

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use pingspace_shared::time::Clock;
use tokio::sync::RwLock;

use crate::domain::{
    ChatMessage, MembershipError, MembershipService, MessageContent, MessageId, MessageRepository,
    PersistenceError, Room, RoomId, ServerId, Username,
};

use super::seed::SeedData;

#[derive(Debug, Default)]
struct DirectoryState {
    rooms: HashMap<RoomId, Room>,
    members: HashMap<ServerId, HashSet<Username>>,
    messages: Vec<ChatMessage>,
    next_message_id: u64,
}

/// インメモリ directory
pub struct InMemoryDirectory {
    clock: Arc<dyn Clock>,
    state: RwLock<DirectoryState>,
}

impl InMemoryDirectory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: RwLock::new(DirectoryState {
                next_message_id: 1,
                ..DirectoryState::default()
            }),
        }
    }

    /// シードデータから directory を構築
    pub fn from_seed(seed: SeedData, clock: Arc<dyn Clock>) -> Self {
        let mut state = DirectoryState {
            next_message_id: 1,
            ..DirectoryState::default()
        };
        for server in seed.servers {
            state
                .members
                .entry(server.id)
                .or_default()
                .extend(server.members);
        }
        for room in seed.rooms {
            let name = if room.name.is_empty() {
                room.id.to_string()
            } else {
                room.name
            };
            state
                .rooms
                .insert(room.id.clone(), Room::new(room.id, room.server_id, name));
        }

        Self {
            clock,
            state: RwLock::new(state),
        }
    }

    pub async fn add_room(&self, room: Room) {
        let mut state = self.state.write().await;
        state.members.entry(room.server_id.clone()).or_default();
        state.rooms.insert(room.id.clone(), room);
    }

    pub async fn add_member(&self, server_id: ServerId, username: Username) {
        let mut state = self.state.write().await;
        state.members.entry(server_id).or_default().insert(username);
    }

    pub async fn remove_member(&self, server_id: &ServerId, username: &Username) {
        let mut state = self.state.write().await;
        if let Some(members) = state.members.get_mut(server_id) {
            members.remove(username);
        }
    }
}

#[async_trait]
impl MembershipService for InMemoryDirectory {
    async fn owner_server_of(&self, room_id: &RoomId) -> Result<ServerId, MembershipError> {
        let state = self.state.read().await;
        state
            .rooms
            .get(room_id)
            .map(|room| room.server_id.clone())
            .ok_or_else(|| MembershipError::RoomNotFound(room_id.to_string()))
    }

    async fn is_member(
        &self,
        username: &Username,
        server_id: &ServerId,
    ) -> Result<bool, MembershipError> {
        let state = self.state.read().await;
        Ok(state
            .members
            .get(server_id)
            .is_some_and(|members| members.contains(username)))
    }
}

#[async_trait]
impl MessageRepository for InMemoryDirectory {
    async fn create_message(
        &self,
        room_id: &RoomId,
        sender: &Username,
        content: MessageContent,
    ) -> Result<ChatMessage, PersistenceError> {
        let mut state = self.state.write().await;
        if !state.rooms.contains_key(room_id) {
            return Err(PersistenceError::StoreFailed(format!(
                "room '{}' does not exist",
                room_id
            )));
        }

        let message = ChatMessage {
            id: MessageId::new(state.next_message_id),
            room_id: room_id.clone(),
            sender: sender.clone(),
            content,
            created_at: self.clock.now(),
        };
        state.next_message_id += 1;
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn messages_for(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, PersistenceError> {
        let state = self.state.read().await;
        let mut messages: Vec<ChatMessage> = state
            .messages
            .iter()
            .filter(|message| &message.room_id == room_id)
            .cloned()
            .collect();
        messages.sort_by_key(|message| (message.created_at, message.id));
        Ok(messages)
    }
}
