//! Connection Registry trait 定義
//!
//! ルームごとの接続集合と、接続 → ユーザー名の逆引きマップを管理する
//! インターフェース。具体的な実装は Infrastructure 層が提供します。
//!
//! 実装は 2 つのマップを必ず同じロックの内側で更新し、
//! どの呼び出し元からも不整合な状態が観測されないことを保証すること。

use async_trait::async_trait;

use super::{ConnectionHandle, ConnectionId, RoomId, Username};

/// disconnect で削除された接続の情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub username: Username,
    /// 削除時点でそのユーザーの接続がルームに 1 本も残っていないか
    pub last_in_room: bool,
}

/// Connection Registry trait
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 接続をルームに登録する
    ///
    /// 同じ接続の再登録は上書きとなり、重複エントリは作らない。
    /// 別のルームに登録済みの接続はそのルームから移動する。
    /// 登録前にそのユーザーの接続がルームに無かった場合 `true` を返す
    /// （判定は登録と同じロックの内側で行う）。
    async fn connect(
        &self,
        room_id: RoomId,
        connection: ConnectionHandle,
        username: Username,
    ) -> bool;

    /// 接続をルームと逆引きマップの両方から削除する
    ///
    /// 削除した場合はユーザー名と、それがルームで最後の接続だったかを返す。
    /// 2 回目以降の呼び出しは `None`。
    async fn disconnect(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<Departure>;

    /// ルームに登録されている接続のスナップショット（コピー）を取得
    async fn connections_for(&self, room_id: &RoomId) -> Vec<ConnectionHandle>;

    /// 接続に紐づくユーザー名を取得
    async fn username_of(&self, connection_id: &ConnectionId) -> Option<Username>;

    /// ルームに接続中のユーザー名一覧（重複なし、昇順）
    async fn online_usernames(&self, room_id: &RoomId) -> Vec<Username>;

    /// ルームに登録されている接続数
    async fn connection_count(&self, room_id: &RoomId) -> usize;
}
