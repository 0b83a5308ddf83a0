//! InMemory Connection Registry 実装
//!
//! ドメイン層が定義する `ConnectionRegistry` trait の具体的な実装。
//!
//! ## 設計ノート
//!
//! ルーム → 接続集合のマップと、接続 → (ユーザー名, ルーム) の逆引きマップを
//! 1 つの `RegistryState` にまとめ、単一の `Mutex` で保護しています。
//! どちらのマップも `RegistryState` のメソッド経由でしか更新されないため、
//! 片方だけが更新された状態を他のタスクが観測することはありません。

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, Departure, RoomId, Username,
};

/// 逆引きエントリ
#[derive(Debug, Clone)]
struct Registration {
    username: Username,
    room_id: RoomId,
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Key: room_id, Value: (connection_id → handle)
    rooms: HashMap<RoomId, HashMap<ConnectionId, ConnectionHandle>>,
    /// Key: connection_id
    registrations: HashMap<ConnectionId, Registration>,
}

impl RegistryState {
    /// 登録前にユーザーの接続がルームに無かった場合 `true`
    fn insert(
        &mut self,
        room_id: RoomId,
        connection: ConnectionHandle,
        username: Username,
    ) -> bool {
        let connection_id = connection.id();
        let first_in_room = !self.has_user_in_room(&room_id, &username);

        // 別のルームに登録済みなら先に外す（1 接続は高々 1 ルーム）
        if let Some(previous) = self.registrations.get(&connection_id)
            && previous.room_id != room_id
        {
            let previous_room = previous.room_id.clone();
            self.remove_from_room(&previous_room, &connection_id);
        }

        self.rooms
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id, connection);
        self.registrations
            .insert(connection_id, Registration { username, room_id });
        first_in_room
    }

    fn remove(&mut self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<Departure> {
        match self.registrations.get(connection_id) {
            Some(registration) if &registration.room_id == room_id => {}
            _ => return None,
        }
        self.remove_from_room(room_id, connection_id);
        let username = self.registrations.remove(connection_id)?.username;
        let last_in_room = !self.has_user_in_room(room_id, &username);
        Some(Departure {
            username,
            last_in_room,
        })
    }

    fn has_user_in_room(&self, room_id: &RoomId, username: &Username) -> bool {
        self.rooms.get(room_id).is_some_and(|connections| {
            connections.keys().any(|id| {
                self.registrations
                    .get(id)
                    .is_some_and(|registration| &registration.username == username)
            })
        })
    }

    fn remove_from_room(&mut self, room_id: &RoomId, connection_id: &ConnectionId) {
        if let Some(connections) = self.rooms.get_mut(room_id) {
            connections.remove(connection_id);
            if connections.is_empty() {
                self.rooms.remove(room_id);
            }
        }
    }
}

/// インメモリ Connection Registry 実装
#[derive(Debug, Default)]
pub struct InMemoryConnectionRegistry {
    state: Mutex<RegistryState>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn connect(
        &self,
        room_id: RoomId,
        connection: ConnectionHandle,
        username: Username,
    ) -> bool {
        let connection_id = connection.id();
        let mut state = self.state.lock().await;
        tracing::debug!(
            room_id = %room_id,
            connection_id = %connection_id,
            username = %username,
            "Connection registered"
        );
        state.insert(room_id, connection, username)
    }

    async fn disconnect(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<Departure> {
        let mut state = self.state.lock().await;
        let removed = state.remove(room_id, connection_id);
        if removed.is_some() {
            tracing::debug!(
                room_id = %room_id,
                connection_id = %connection_id,
                "Connection unregistered"
            );
        }
        removed
    }

    async fn connections_for(&self, room_id: &RoomId) -> Vec<ConnectionHandle> {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room_id)
            .map(|connections| connections.values().cloned().collect())
            .unwrap_or_default()
    }

    async fn username_of(&self, connection_id: &ConnectionId) -> Option<Username> {
        let state = self.state.lock().await;
        state
            .registrations
            .get(connection_id)
            .map(|registration| registration.username.clone())
    }

    async fn online_usernames(&self, room_id: &RoomId) -> Vec<Username> {
        let state = self.state.lock().await;
        let Some(connections) = state.rooms.get(room_id) else {
            return Vec::new();
        };
        connections
            .keys()
            .filter_map(|id| state.registrations.get(id))
            .map(|registration| registration.username.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    async fn connection_count(&self, room_id: &RoomId) -> usize {
        let state = self.state.lock().await;
        state.rooms.get(room_id).map_or(0, HashMap::len)
    }
}
