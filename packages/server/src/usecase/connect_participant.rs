//! UseCase: 参加者接続処理
//!
//! ハンドシェイク（トークン検証 → ルームアクセス確認）と、
//! 承認済み接続のレジストリ登録・入室通知をまとめたユースケース。
//!
//! ### どのような状況を想定しているか
//! - 正常系：メンバーがルームに接続し、他の参加者に user_joined が届く
//! - 異常系：トークン不正・ルームなし・非メンバー（いずれも登録されない）
//! - エッジケース：同じユーザーの 2 本目の接続（user_joined は送らない）

use std::sync::Arc;

use crate::{
    domain::{ConnectionHandle, ConnectionRegistry},
    infrastructure::dto::{
        conversion::usernames_to_strings,
        websocket::{Notice, encode},
    },
};

use super::{
    admission::{Admission, RoomAccessGate, TokenValidator},
    broadcast::BroadcastEngine,
    error::ConnectError,
};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    token_validator: TokenValidator,
    gate: RoomAccessGate,
    registry: Arc<dyn ConnectionRegistry>,
    broadcaster: Arc<BroadcastEngine>,
}

impl ConnectParticipantUseCase {
    pub fn new(
        token_validator: TokenValidator,
        gate: RoomAccessGate,
        registry: Arc<dyn ConnectionRegistry>,
        broadcaster: Arc<BroadcastEngine>,
    ) -> Self {
        Self {
            token_validator,
            gate,
            registry,
            broadcaster,
        }
    }

    /// ハンドシェイク時の認可
    ///
    /// トークン検証が失敗した場合、ルームの存在確認は行わない。
    /// ここで `Err` を返した接続は決してレジストリに登録されない。
    pub async fn admit(
        &self,
        token: Option<&str>,
        room_id: &str,
    ) -> Result<Admission, ConnectError> {
        let username = self.token_validator.validate(token)?;
        let room_id = self.gate.authorize(room_id, &username).await?;
        Ok(Admission { username, room_id })
    }

    /// 承認済みの接続をルームに登録する
    ///
    /// ユーザーにとってそのルームで最初の接続だった場合は user_joined を
    /// ルーム全体に配信し、`true` を返す。
    pub async fn register(&self, admission: &Admission, connection: ConnectionHandle) -> bool {
        let Admission { username, room_id } = admission;

        let connection_id = connection.id();
        let first_in_room = self
            .registry
            .connect(room_id.clone(), connection, username.clone())
            .await;
        tracing::info!(
            room_id = %room_id,
            username = %username,
            connection_id = %connection_id,
            "Connection accepted"
        );

        if !first_in_room {
            return false;
        }

        let notice = Notice::UserJoined {
            username: username.as_str().to_string(),
            online: usernames_to_strings(self.registry.online_usernames(room_id).await),
        };
        match encode(&notice) {
            Ok(payload) => {
                self.broadcaster.broadcast(room_id, &payload).await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to encode user_joined notice");
            }
        }
        true
    }
}
