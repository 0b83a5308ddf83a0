//! UseCase: ルーム情報の取得（HTTP API 用）
//!
//! WebSocket のハンドシェイクと同じ認可（トークン → ルームアクセス）を通した上で、
//! オンラインユーザー一覧とメッセージ履歴を返す。

use std::sync::Arc;

use crate::domain::{ChatMessage, ConnectionRegistry, MessageRepository, RoomId, Username};

use super::{
    admission::{RoomAccessGate, TokenValidator},
    error::ConnectError,
};

/// ルーム情報取得のユースケース
pub struct GetRoomInfoUseCase {
    token_validator: TokenValidator,
    gate: RoomAccessGate,
    registry: Arc<dyn ConnectionRegistry>,
    repository: Arc<dyn MessageRepository>,
}

impl GetRoomInfoUseCase {
    pub fn new(
        token_validator: TokenValidator,
        gate: RoomAccessGate,
        registry: Arc<dyn ConnectionRegistry>,
        repository: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            token_validator,
            gate,
            registry,
            repository,
        }
    }

    async fn authorize(&self, token: Option<&str>, room_id: &str) -> Result<RoomId, ConnectError> {
        let username = self.token_validator.validate(token)?;
        self.gate.authorize(room_id, &username).await
    }

    /// ルームに接続中のユーザー名一覧
    pub async fn online(
        &self,
        token: Option<&str>,
        room_id: &str,
    ) -> Result<(RoomId, Vec<Username>), ConnectError> {
        let room_id = self.authorize(token, room_id).await?;
        let online = self.registry.online_usernames(&room_id).await;
        Ok((room_id, online))
    }

    /// ルームのメッセージ履歴（時刻昇順）
    pub async fn history(
        &self,
        token: Option<&str>,
        room_id: &str,
    ) -> Result<Vec<ChatMessage>, ConnectError> {
        let room_id = self.authorize(token, room_id).await?;
        self.repository
            .messages_for(&room_id)
            .await
            .map_err(|err| ConnectError::Unavailable(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ConnectionHandle, IdentityError, MembershipError, ServerId, pusher_channel,
            service::{MockIdentityService, MockMembershipService, MockMessageRepository},
        },
        infrastructure::registry::InMemoryConnectionRegistry,
    };

    fn user(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn create_usecase(
        repository: MockMessageRepository,
    ) -> (GetRoomInfoUseCase, Arc<InMemoryConnectionRegistry>) {
        let mut identity = MockIdentityService::new();
        identity.expect_verify().returning(|token| match token {
            "alice" | "mallory" => Ok(Username::new(token.to_string()).unwrap()),
            _ => Err(IdentityError::InvalidToken("bad token".to_string())),
        });
        let mut membership = MockMembershipService::new();
        membership.expect_owner_server_of().returning(|room_id| {
            if room_id.as_str() == "general" {
                Ok(ServerId::new("s1".to_string()).unwrap())
            } else {
                Err(MembershipError::RoomNotFound(room_id.to_string()))
            }
        });
        membership
            .expect_is_member()
            .returning(|username, _| Ok(username.as_str() == "alice"));

        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = GetRoomInfoUseCase::new(
            TokenValidator::new(Arc::new(identity)),
            RoomAccessGate::new(Arc::new(membership)),
            registry.clone(),
            Arc::new(repository),
        );
        (usecase, registry)
    }

    #[tokio::test]
    async fn test_online_lists_connected_users() {
        // テスト項目: メンバーはルームのオンラインユーザー一覧を取得できる
        // given (前提条件):
        let (usecase, registry) = create_usecase(MockMessageRepository::new());
        let (tx, _rx) = pusher_channel();
        registry
            .connect(room("general"), ConnectionHandle::new(tx), user("bob"))
            .await;

        // when (操作):
        let result = usecase.online(Some("alice"), "general").await;

        // then (期待する結果):
        assert_eq!(result, Ok((room("general"), vec![user("bob")])));
    }

    #[tokio::test]
    async fn test_online_follows_handshake_taxonomy() {
        // テスト項目: 認可の失敗はハンドシェイクと同じエラー分類になる
        // given (前提条件):
        let (usecase, _registry) = create_usecase(MockMessageRepository::new());

        // when (操作):
        let invalid = usecase.online(Some("forged"), "general").await;
        let no_room = usecase.online(Some("alice"), "nowhere").await;
        let outsider = usecase.online(Some("mallory"), "general").await;

        // then (期待する結果):
        assert!(matches!(invalid, Err(ConnectError::InvalidToken(_))));
        assert!(matches!(no_room, Err(ConnectError::RoomNotFound(_))));
        assert_eq!(outsider, Err(ConnectError::NotAMember));
    }

    #[tokio::test]
    async fn test_history_maps_persistence_failure_to_unavailable() {
        // テスト項目: 履歴の読み込み失敗は Unavailable になる
        // given (前提条件):
        let mut repository = MockMessageRepository::new();
        repository
            .expect_messages_for()
            .returning(|_| Err(crate::domain::PersistenceError::LoadFailed("io".to_string())));
        let (usecase, _registry) = create_usecase(repository);

        // when (操作):
        let result = usecase.history(Some("alice"), "general").await;

        // then (期待する結果):
        assert!(matches!(result, Err(ConnectError::Unavailable(_))));
    }
}
