//! UseCase: Broadcast Engine
//!
//! ルームのスナップショットに対してペイロードを配信し、送信に失敗した接続を
//! レジストリから取り除きます。
//!
//! - 1 つの接続の失敗が他の接続への配信を妨げることはない
//! - 失敗した接続の削除は配信ループが終わった後にまとめて行う
//!   （スナップショットを走査中にレジストリを変更しない）

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, RoomId};

/// Close code used when a stale connection is pruned
pub const STALE_CLOSE_CODE: u16 = 1011;

/// 配信結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// 送信キューへの投入に成功した接続数
    pub delivered: usize,
    /// 失敗してレジストリから削除された接続
    pub pruned: Vec<ConnectionId>,
}

/// Broadcast Engine
pub struct BroadcastEngine {
    registry: Arc<dyn ConnectionRegistry>,
}

impl BroadcastEngine {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// ルームの全接続にペイロードを送信する
    ///
    /// 送信できなかった接続はクローズを要求した上でレジストリから削除する。
    /// 削除された接続は同じ呼び出しの中で再度送信対象になることはない。
    pub async fn broadcast(&self, room_id: &RoomId, payload: &str) -> BroadcastReport {
        let connections = self.registry.connections_for(room_id).await;

        let mut report = BroadcastReport::default();
        let mut stale = Vec::new();
        for connection in connections {
            match connection.push(payload) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    tracing::warn!(
                        room_id = %room_id,
                        connection_id = %connection.id(),
                        error = %err,
                        "Failed to deliver to connection, pruning"
                    );
                    stale.push(connection);
                }
            }
        }

        for connection in stale {
            connection.close(STALE_CLOSE_CODE, "connection is no longer writable");
            let connection_id = connection.id();
            self.registry.disconnect(room_id, &connection_id).await;
            report.pruned.push(connection_id);
        }

        tracing::debug!(
            room_id = %room_id,
            delivered = report.delivered,
            pruned = report.pruned.len(),
            "Broadcast finished"
        );
        report
    }
}
