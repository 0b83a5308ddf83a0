//! 外部コラボレーターのインターフェース定義
//!
//! コアが必要とする Identity / Membership / Persistence の各サービスを
//! ドメイン層自身が定義し、Infrastructure 層がそれを実装します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    ChatMessage, IdentityError, MembershipError, MessageContent, PersistenceError, RoomId,
    ServerId, Username,
};

/// Identity Service
///
/// セッショントークンを検証し、認証済みのユーザー名を返す。
/// 暗号学的な検証のみを行い、共有可変状態を持たない。
#[cfg_attr(test, mockall::automock)]
pub trait IdentityService: Send + Sync {
    fn verify(&self, token: &str) -> Result<Username, IdentityError>;
}

/// Membership Service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipService: Send + Sync {
    /// ルームを所有するサーバーの ID を取得
    async fn owner_server_of(&self, room_id: &RoomId) -> Result<ServerId, MembershipError>;

    /// ユーザーがサーバーのメンバーかどうか
    async fn is_member(
        &self,
        username: &Username,
        server_id: &ServerId,
    ) -> Result<bool, MembershipError>;
}

/// Persistence Service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを永続化し、サーバー側で採番された id と時刻付きで返す
    async fn create_message(
        &self,
        room_id: &RoomId,
        sender: &Username,
        content: MessageContent,
    ) -> Result<ChatMessage, PersistenceError>;

    /// ルームのメッセージ履歴（時刻昇順）
    async fn messages_for(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, PersistenceError>;
}
