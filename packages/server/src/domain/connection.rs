//! Connection handle and lifecycle.
//!
//! A [`ConnectionHandle`] is the registry's view of one socket: an id plus the
//! sending half of a bounded channel that feeds the socket's writer task.
//! Pushes fail when the writer is gone or when its queue is full, which is how
//! broadcasts detect stale or slow sockets.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use super::{
    error::{ConnectionStateError, TransportError},
    value_object::ConnectionId,
};

/// Frames a connection may have queued before it is treated as stale
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Frames the writer task knows how to put on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Close { code: u16, reason: String },
}

/// Channel into a connection's socket writer
pub type PusherChannel = mpsc::Sender<OutboundFrame>;

/// Receiving half drained by the socket writer
pub type PusherQueue = mpsc::Receiver<OutboundFrame>;

/// Open a writer queue with the default capacity
pub fn pusher_channel() -> (PusherChannel, PusherQueue) {
    mpsc::channel(OUTBOUND_QUEUE_CAPACITY)
}

/// Registry-owned handle to one live connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    channel: PusherChannel,
    shutdown: CancellationToken,
}

impl ConnectionHandle {
    pub fn new(channel: PusherChannel) -> Self {
        Self {
            id: ConnectionId::generate(),
            channel,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Token the writer task watches; cancelled when a close cannot be queued
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Queue a text frame for this connection. Never waits: a full queue
    /// fails the same way as a closed one.
    pub fn push(&self, payload: &str) -> Result<(), TransportError> {
        self.channel
            .try_send(OutboundFrame::Text(payload.to_string()))
            .map_err(|err| {
                let reason = match err {
                    TrySendError::Full(_) => "outbound queue full",
                    TrySendError::Closed(_) => "writer closed",
                };
                TransportError(format!("{} ({})", self.id, reason))
            })
    }

    /// Ask the writer to close the socket. If the close frame cannot be
    /// queued the writer is cancelled instead and drops the socket.
    pub fn close(&self, code: u16, reason: &str) {
        let frame = OutboundFrame::Close {
            code,
            reason: reason.to_string(),
        };
        if self.channel.try_send(frame).is_err() {
            self.shutdown.cancel();
        }
    }
}

/// Lifecycle of a connection, from handshake to purge.
///
/// ```text
/// Pending -> Authorized -> Accepted -> Closing -> Removed
///    |           |
///    +-----------+--------------------------------> Removed  (handshake rejected)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Token received, not yet validated
    Pending,
    /// Token and membership verified
    Authorized,
    /// Registered in the room, read loop active
    Accepted,
    /// Disconnect detected locally or remotely
    Closing,
    /// Terminal; purged from the registry
    Removed,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Pending, Authorized)
                | (Pending, Removed)
                | (Authorized, Accepted)
                | (Authorized, Removed)
                | (Accepted, Closing)
                | (Closing, Removed)
        )
    }

    pub fn transition(self, next: ConnectionState) -> Result<ConnectionState, ConnectionStateError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ConnectionStateError {
                from: self,
                to: next,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        // テスト項目: 正常系の状態遷移 Pending → Authorized → Accepted → Closing → Removed
        // given (前提条件):
        let state = ConnectionState::Pending;

        // when (操作):
        let result = state
            .transition(ConnectionState::Authorized)
            .and_then(|s| s.transition(ConnectionState::Accepted))
            .and_then(|s| s.transition(ConnectionState::Closing))
            .and_then(|s| s.transition(ConnectionState::Removed));

        // then (期待する結果):
        assert_eq!(result, Ok(ConnectionState::Removed));
    }

    #[test]
    fn test_accepted_cannot_skip_closing() {
        // テスト項目: Accepted から Closing を経由せずに Removed へは遷移できない
        // given (前提条件):
        let state = ConnectionState::Accepted;

        // when (操作):
        let result = state.transition(ConnectionState::Removed);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConnectionStateError {
                from: ConnectionState::Accepted,
                to: ConnectionState::Removed,
            })
        );
    }

    #[test]
    fn test_rejected_handshake_goes_straight_to_removed() {
        // テスト項目: ハンドシェイク拒否時は Pending / Authorized から直接 Removed に遷移できる
        // given (前提条件):

        // when (操作):
        let from_pending = ConnectionState::Pending.transition(ConnectionState::Removed);
        let from_authorized = ConnectionState::Authorized.transition(ConnectionState::Removed);

        // then (期待する結果):
        assert_eq!(from_pending, Ok(ConnectionState::Removed));
        assert_eq!(from_authorized, Ok(ConnectionState::Removed));
    }

    #[test]
    fn test_removed_is_terminal() {
        // テスト項目: Removed からはどの状態にも遷移できない
        // given (前提条件):
        let state = ConnectionState::Removed;

        // when (操作):
        let targets = [
            ConnectionState::Pending,
            ConnectionState::Authorized,
            ConnectionState::Accepted,
            ConnectionState::Closing,
        ];

        // then (期待する結果):
        for target in targets {
            assert!(!state.can_transition_to(target));
        }
    }

    #[tokio::test]
    async fn test_push_fails_once_writer_is_gone() {
        // テスト項目: writer 側の受信チャンネルが破棄されると push が失敗する
        // given (前提条件):
        let (tx, rx) = pusher_channel();
        let handle = ConnectionHandle::new(tx);
        drop(rx);

        // when (操作):
        let result = handle.push("hello");

        // then (期待する結果):
        assert_eq!(
            result,
            Err(TransportError(format!("{} (writer closed)", handle.id())))
        );
    }

    #[tokio::test]
    async fn test_push_fails_when_queue_is_full() {
        // テスト項目: 受信側が読み出さずキューが満杯になると push が待たずに失敗する
        // given (前提条件):
        let (tx, mut rx) = mpsc::channel(2);
        let handle = ConnectionHandle::new(tx);
        handle.push("one").unwrap();
        handle.push("two").unwrap();

        // when (操作):
        let result = handle.push("three");

        // then (期待する結果):
        assert_eq!(
            result,
            Err(TransportError(format!("{} (outbound queue full)", handle.id())))
        );
        assert_eq!(rx.try_recv(), Ok(OutboundFrame::Text("one".to_string())));
    }

    #[tokio::test]
    async fn test_close_queues_close_frame() {
        // テスト項目: close を呼ぶと Close フレームがキューに積まれる
        // given (前提条件):
        let (tx, mut rx) = pusher_channel();
        let handle = ConnectionHandle::new(tx);

        // when (操作):
        handle.close(1011, "stale");

        // then (期待する結果):
        assert_eq!(
            rx.recv().await,
            Some(OutboundFrame::Close {
                code: 1011,
                reason: "stale".to_string()
            })
        );
        assert!(!handle.shutdown_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_close_cancels_writer_when_queue_is_full() {
        // テスト項目: キューが満杯で Close フレームを積めない場合は writer をキャンセルする
        // given (前提条件):
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);
        handle.push("backlog").unwrap();

        // when (操作):
        handle.close(1011, "stale");

        // then (期待する結果):
        assert!(handle.shutdown_token().is_cancelled());
    }
}
