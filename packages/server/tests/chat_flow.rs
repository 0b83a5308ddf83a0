//! Integration tests: a real server on an ephemeral port, driven over
//! WebSocket (tokio-tungstenite) and HTTP (reqwest).

use std::{net::SocketAddr, sync::Arc, time::Duration};

use chrono::TimeDelta;
use futures_util::{SinkExt, StreamExt};
use pingspace_server::{
    bootstrap::build_server,
    config::ServerConfig,
    domain::Username,
    infrastructure::{
        directory::{InMemoryDirectory, SeedData},
        identity::{JwtConfig, JwtIdentityService},
    },
};
use pingspace_shared::time::SystemClock;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SEED: &str = r#"{
    "servers": [
        { "id": "games", "members": ["alice", "bob"] },
        { "id": "work", "members": ["dave"] }
    ],
    "rooms": [
        { "id": "general", "server_id": "games" },
        { "id": "standup", "server_id": "work" }
    ]
}"#;

struct TestServer {
    addr: SocketAddr,
    identity: Arc<JwtIdentityService>,
}

impl TestServer {
    async fn start() -> Self {
        let config = ServerConfig {
            jwt: JwtConfig {
                secret: "integration-secret".to_string(),
                token_ttl: TimeDelta::minutes(5),
            },
            ..ServerConfig::default()
        };
        let directory = Arc::new(InMemoryDirectory::from_seed(
            SeedData::from_json(SEED).unwrap(),
            Arc::new(SystemClock),
        ));
        let identity = Arc::new(JwtIdentityService::new(config.jwt.clone()));
        let server = build_server(&config, directory, identity.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = server.run_with_listener(listener).await;
        });

        Self { addr, identity }
    }

    fn token(&self, username: &str) -> String {
        self.identity
            .issue_token(&Username::new(username.to_string()).unwrap())
            .unwrap()
    }

    fn ws_url(&self, room: &str, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("ws://{}/ws/{}?token={}", self.addr, room, token),
            None => format!("ws://{}/ws/{}", self.addr, room),
        }
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn connect(&self, room: &str, username: &str) -> Socket {
        let token = self.token(username);
        let (socket, _) = connect_async(self.ws_url(room, Some(&token))).await.unwrap();
        socket
    }
}

/// Next text frame as JSON, skipping control frames
async fn next_json(socket: &mut Socket) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Close(frame) => panic!("unexpected close: {:?}", frame),
            _ => continue,
        }
    }
}

/// Close code of the next close frame
async fn next_close_code(socket: &mut Socket) -> u16 {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for close")
            .expect("stream ended before close")
            .expect("websocket error");
        if let Message::Close(frame) = msg {
            return frame.map(|f| u16::from(f.code)).unwrap_or(1005);
        }
    }
}

#[tokio::test]
async fn test_member_message_is_persisted_and_broadcast() {
    // テスト項目: メンバーが送ったメッセージがルーム全員（送信者を含む）に届き、履歴に残る
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("general", "alice").await;
    assert_eq!(next_json(&mut alice).await["type"], "user_joined");
    let mut bob = server.connect("general", "bob").await;
    let joined = next_json(&mut alice).await;
    assert_eq!(
        joined,
        serde_json::json!({ "type": "user_joined", "username": "bob", "online": ["alice", "bob"] })
    );
    assert_eq!(next_json(&mut bob).await["type"], "user_joined");

    // when (操作):
    alice.send(Message::Text("hello".into())).await.unwrap();

    // then (期待する結果):
    for socket in [&mut alice, &mut bob] {
        let chat = next_json(socket).await;
        assert_eq!(chat["sender"], "alice");
        assert_eq!(chat["content"], "hello");
        assert!(chat["created_at"].as_str().unwrap().ends_with('Z'));
        assert!(chat.get("type").is_none());
    }

    let history: serde_json::Value = reqwest::Client::new()
        .get(server.http_url("/api/rooms/general/messages"))
        .bearer_auth(server.token("bob"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["content"], "hello");
}

#[tokio::test]
async fn test_invalid_or_missing_token_closes_with_1008() {
    // テスト項目: 不正なトークン、またはトークンなしの接続は 1008 で閉じられる
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let (mut forged, _) = connect_async(server.ws_url("general", Some("not-a-token")))
        .await
        .unwrap();
    let (mut missing, _) = connect_async(server.ws_url("general", None)).await.unwrap();

    // then (期待する結果):
    assert_eq!(next_close_code(&mut forged).await, 1008);
    assert_eq!(next_close_code(&mut missing).await, 1008);
}

#[tokio::test]
async fn test_unknown_room_and_non_member_are_rejected() {
    // テスト項目: 存在しないルームは 4404、所有サーバーの非メンバーは 4403 で閉じられる
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let mut unknown = server.connect("nowhere", "alice").await;
    let mut outsider = server.connect("standup", "alice").await;

    // then (期待する結果):
    assert_eq!(next_close_code(&mut unknown).await, 4404);
    assert_eq!(next_close_code(&mut outsider).await, 4403);
}

#[tokio::test]
async fn test_eleventh_message_in_window_is_rate_limited() {
    // テスト項目: 10 秒以内の 11 件目は送信者にだけ rate_limit が返り、保存されない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("general", "alice").await;
    next_json(&mut alice).await;

    // when (操作):
    for i in 0..11 {
        alice
            .send(Message::Text(format!("message {}", i).into()))
            .await
            .unwrap();
    }

    // then (期待する結果):
    for i in 0..10 {
        let chat = next_json(&mut alice).await;
        assert_eq!(chat["content"], format!("message {}", i));
    }
    let notice = next_json(&mut alice).await;
    assert_eq!(notice["type"], "rate_limit");
    assert!(notice["error"].as_str().is_some());

    let history: Vec<serde_json::Value> = reqwest::Client::new()
        .get(server.http_url("/api/rooms/general/messages"))
        .bearer_auth(server.token("alice"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 10);
}

#[tokio::test]
async fn test_departure_announces_user_left() {
    // テスト項目: 最後の接続が閉じると残りの参加者に user_left が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("general", "alice").await;
    next_json(&mut alice).await;
    let mut bob = server.connect("general", "bob").await;
    next_json(&mut alice).await;

    // when (操作):
    bob.close(None).await.unwrap();

    // then (期待する結果):
    let left = next_json(&mut alice).await;
    assert_eq!(
        left,
        serde_json::json!({ "type": "user_left", "username": "bob", "online": ["alice"] })
    );
}

#[tokio::test]
async fn test_health_and_online_endpoints() {
    // テスト項目: /health と /api/rooms/{room_id}/online の応答
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let mut alice = server.connect("general", "alice").await;
    next_json(&mut alice).await;

    // when (操作):
    let health: serde_json::Value = client
        .get(server.http_url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let online = client
        .get(server.http_url("/api/rooms/general/online"))
        .bearer_auth(server.token("bob"))
        .send()
        .await
        .unwrap();
    let unauthenticated = client
        .get(server.http_url("/api/rooms/general/online"))
        .send()
        .await
        .unwrap();
    let outsider = client
        .get(server.http_url("/api/rooms/general/online"))
        .bearer_auth(server.token("dave"))
        .send()
        .await
        .unwrap();
    let unknown = client
        .get(server.http_url("/api/rooms/nowhere/online"))
        .bearer_auth(server.token("bob"))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(health, serde_json::json!({ "status": "ok" }));
    assert_eq!(online.status(), reqwest::StatusCode::OK);
    let online: serde_json::Value = online.json().await.unwrap();
    assert_eq!(
        online,
        serde_json::json!({ "room_id": "general", "online": ["alice"] })
    );
    assert_eq!(unauthenticated.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(outsider.status(), reqwest::StatusCode::FORBIDDEN);
    assert_eq!(unknown.status(), reqwest::StatusCode::NOT_FOUND);
}
