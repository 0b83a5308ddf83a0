//! UseCase: メッセージ送信処理（Message Pipeline）
//!
//! 受信した 1 フレームごとに、決まった順序で処理する:
//!
//! 1. レート制限の確認（拒否された場合は送信者にのみ rate_limit を返す）
//! 2. 内容の検証と永続化（失敗した場合は送信者にのみ error を 1 回返す）
//! 3. ルームへのブロードキャスト
//!
//! 2 と 3 はルームごとの非同期ロックの内側で行うため、同じルームの
//! ブロードキャストは永続化のコミット順に並ぶ。

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use tokio::sync::Mutex;

use crate::{
    domain::{
        ChatMessage, ConnectionHandle, MessageContent, MessageRepository, RateLimitPolicy,
        RateLimiter, RoomId, Username,
    },
    infrastructure::dto::websocket::{ChatPayload, Notice, RATE_LIMIT_MESSAGE, encode},
};

use super::{
    broadcast::{BroadcastEngine, BroadcastReport},
    error::SendMessageError,
};

const PERSISTENCE_FAILED_MESSAGE: &str = "Failed to save message";

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    rate_limiter: Arc<dyn RateLimiter>,
    policy: RateLimitPolicy,
    repository: Arc<dyn MessageRepository>,
    broadcaster: Arc<BroadcastEngine>,
    /// Key: room_id, Value: そのルームのパイプラインロック
    room_locks: StdMutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl SendMessageUseCase {
    pub fn new(
        rate_limiter: Arc<dyn RateLimiter>,
        policy: RateLimitPolicy,
        repository: Arc<dyn MessageRepository>,
        broadcaster: Arc<BroadcastEngine>,
    ) -> Self {
        Self {
            rate_limiter,
            policy,
            repository,
            broadcaster,
            room_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `room_id` - 接続が登録されているルーム
    /// * `sender` - ハンドシェイクで認証されたユーザー名
    /// * `origin` - フレームを受信した接続（通知の返送先）
    /// * `text` - 受信したテキスト
    ///
    /// # Returns
    ///
    /// * `Ok((ChatMessage, BroadcastReport))` - 永続化されたメッセージと配信結果
    /// * `Err(SendMessageError)` - このメッセージだけが破棄された（接続は継続）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        sender: &Username,
        origin: &ConnectionHandle,
        text: String,
    ) -> Result<(ChatMessage, BroadcastReport), SendMessageError> {
        if !self
            .rate_limiter
            .can_send(sender, self.policy.max_messages, self.policy.window)
        {
            tracing::info!(room_id = %room_id, username = %sender, "Rate limit exceeded");
            notify(
                origin,
                &Notice::RateLimit {
                    error: RATE_LIMIT_MESSAGE.to_string(),
                },
            );
            return Err(SendMessageError::RateLimited);
        }

        let content = match MessageContent::new(text) {
            Ok(content) => content,
            Err(err) => {
                notify(
                    origin,
                    &Notice::Error {
                        error: err.to_string(),
                    },
                );
                return Err(SendMessageError::InvalidContent(err.to_string()));
            }
        };

        let lock = self.room_lock(room_id);
        let _guard = lock.lock().await;

        let message = match self.repository.create_message(room_id, sender, content).await {
            Ok(message) => message,
            Err(err) => {
                tracing::error!(
                    room_id = %room_id,
                    username = %sender,
                    error = %err,
                    "Failed to persist message"
                );
                notify(
                    origin,
                    &Notice::Error {
                        error: PERSISTENCE_FAILED_MESSAGE.to_string(),
                    },
                );
                return Err(err.into());
            }
        };

        let payload = encode(&ChatPayload::from(&message))
            .map_err(|err| SendMessageError::Encode(err.to_string()))?;
        let report = self.broadcaster.broadcast(room_id, &payload).await;

        Ok((message, report))
    }

    fn room_lock(&self, room_id: &RoomId) -> Arc<Mutex<()>> {
        let mut locks = self
            .room_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(room_id.clone()).or_default().clone()
    }
}

/// 送信者にだけ通知を返す（接続が既に閉じていれば捨てる）
fn notify(origin: &ConnectionHandle, notice: &Notice) {
    let payload = match encode(notice) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!(error = %err, "Failed to encode notice");
            return;
        }
    };
    if let Err(err) = origin.push(&payload) {
        tracing::debug!(error = %err, "Notice dropped, connection already closed");
    }
}
