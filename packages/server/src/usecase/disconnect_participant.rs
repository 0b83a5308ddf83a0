//! UseCase: 参加者切断処理
//!
//! ### どのような状況を想定しているか
//! - 正常系：ユーザーの最後の接続が切れると user_left が残りの参加者に届く
//! - エッジケース：同じユーザーの別接続が残っている場合（通知しない）
//! - エッジケース：同じ接続の二重切断（2 回目は何もしない）

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, ConnectionRegistry, RoomId},
    infrastructure::dto::{
        conversion::usernames_to_strings,
        websocket::{Notice, encode},
    },
};

use super::broadcast::BroadcastEngine;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    broadcaster: Arc<BroadcastEngine>,
}

impl DisconnectParticipantUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>, broadcaster: Arc<BroadcastEngine>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// 接続をレジストリから削除する
    ///
    /// 冪等。既に削除済み（ブロードキャスト時に刈り取られた場合を含む）なら
    /// 何もせず `false` を返す。
    pub async fn execute(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        let Some(departure) = self.registry.disconnect(room_id, connection_id).await else {
            return false;
        };
        let username = departure.username;
        tracing::info!(
            room_id = %room_id,
            username = %username,
            connection_id = %connection_id,
            "Connection removed"
        );

        if !departure.last_in_room {
            return true;
        }

        let notice = Notice::UserLeft {
            username: username.into_string(),
            online: usernames_to_strings(self.registry.online_usernames(room_id).await),
        };
        match encode(&notice) {
            Ok(payload) => {
                self.broadcaster.broadcast(room_id, &payload).await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to encode user_left notice");
            }
        }
        true
    }
}
