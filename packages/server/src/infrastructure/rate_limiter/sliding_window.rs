//! Sliding-window rate limiter.
//!
//! Keeps, per username, the timestamps of recent accepted sends. Entries
//! older than the window are evicted lazily on the next check for that
//! username. Usernames are never evicted from the map itself, so memory
//! grows with the number of distinct senders seen since startup.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use pingspace_shared::time::{Clock, SystemClock};

use crate::domain::{RateLimiter, Username};

/// In-memory sliding-window limiter
pub struct SlidingWindowRateLimiter {
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<Username, VecDeque<DateTime<Utc>>>>,
}

impl SlidingWindowRateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Number of sends currently retained for `username` (without evicting)
    pub fn recorded_sends(&self, username: &Username) -> usize {
        let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows.get(username).map_or(0, VecDeque::len)
    }

    /// Number of usernames with a window entry
    pub fn tracked_users(&self) -> usize {
        let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows.len()
    }
}

impl Default for SlidingWindowRateLimiter {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl RateLimiter for SlidingWindowRateLimiter {
    fn can_send(&self, username: &Username, max_messages: usize, window: Duration) -> bool {
        let now = self.clock.now();
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        let cutoff = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);

        // check-and-record happens under one lock so concurrent sends by the
        // same user cannot both slip through the last free slot
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let sends = windows.entry(username.clone()).or_default();

        while sends.front().is_some_and(|sent_at| *sent_at <= cutoff) {
            sends.pop_front();
        }

        if sends.len() >= max_messages {
            tracing::debug!(
                username = %username,
                recent = sends.len(),
                max_messages,
                "Send rejected by rate limiter"
            );
            return false;
        }

        sends.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pingspace_shared::time::ManualClock;

    const MAX: usize = 10;
    const WINDOW: Duration = Duration::from_secs(10);

    fn user(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    fn limiter() -> (SlidingWindowRateLimiter, Arc<ManualClock>) {
        let start = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        let clock = Arc::new(ManualClock::new(start));
        (SlidingWindowRateLimiter::new(clock.clone()), clock)
    }

    #[test]
    fn test_accepts_up_to_max_within_window() {
        // テスト項目: 1 秒以内に 10 件送信するとすべて受理される
        // given (前提条件):
        let (limiter, clock) = limiter();
        let alice = user("alice");

        // when (操作):
        let results: Vec<bool> = (0..10)
            .map(|_| {
                clock.advance(TimeDelta::milliseconds(100));
                limiter.can_send(&alice, MAX, WINDOW)
            })
            .collect();

        // then (期待する結果):
        assert!(results.iter().all(|accepted| *accepted));
        assert_eq!(limiter.recorded_sends(&alice), 10);
    }

    #[test]
    fn test_rejects_eleventh_without_recording() {
        // テスト項目: 同じウィンドウ内の 11 件目は拒否され、記録もされない
        // given (前提条件):
        let (limiter, _clock) = limiter();
        let alice = user("alice");
        for _ in 0..10 {
            assert!(limiter.can_send(&alice, MAX, WINDOW));
        }

        // when (操作):
        let eleventh = limiter.can_send(&alice, MAX, WINDOW);
        let twelfth = limiter.can_send(&alice, MAX, WINDOW);

        // then (期待する結果):
        assert!(!eleventh);
        assert!(!twelfth);
        assert_eq!(limiter.recorded_sends(&alice), 10);
    }

    #[test]
    fn test_accepts_again_after_window_elapses() {
        // テスト項目: ウィンドウが完全に経過すると再び送信できる
        // given (前提条件):
        let (limiter, clock) = limiter();
        let alice = user("alice");
        for _ in 0..10 {
            assert!(limiter.can_send(&alice, MAX, WINDOW));
        }
        assert!(!limiter.can_send(&alice, MAX, WINDOW));

        // when (操作):
        clock.advance(TimeDelta::seconds(10));
        let result = limiter.can_send(&alice, MAX, WINDOW);

        // then (期待する結果):
        assert!(result);
        assert_eq!(limiter.recorded_sends(&alice), 1);
    }

    #[test]
    fn test_window_slides_instead_of_resetting() {
        // テスト項目: 古い送信だけが順に期限切れになる（固定窓ではなくスライディング窓）
        // given (前提条件):
        let (limiter, clock) = limiter();
        let alice = user("alice");
        // t=0s に 5 件、t=5s に 5 件
        for _ in 0..5 {
            assert!(limiter.can_send(&alice, MAX, WINDOW));
        }
        clock.advance(TimeDelta::seconds(5));
        for _ in 0..5 {
            assert!(limiter.can_send(&alice, MAX, WINDOW));
        }

        // when (操作): t=10s では最初の 5 件だけが期限切れ
        clock.advance(TimeDelta::seconds(5));
        let accepted: usize = (0..10)
            .filter(|_| limiter.can_send(&alice, MAX, WINDOW))
            .count();

        // then (期待する結果):
        assert_eq!(accepted, 5);
    }

    #[test]
    fn test_users_are_limited_independently() {
        // テスト項目: ユーザーごとに独立して制限される
        // given (前提条件):
        let (limiter, _clock) = limiter();
        let alice = user("alice");
        let bob = user("bob");
        for _ in 0..10 {
            assert!(limiter.can_send(&alice, MAX, WINDOW));
        }

        // when (操作):
        let result = limiter.can_send(&bob, MAX, WINDOW);

        // then (期待する結果):
        assert!(result);
        assert!(!limiter.can_send(&alice, MAX, WINDOW));
    }

    #[test]
    fn test_entries_are_never_evicted() {
        // テスト項目: ウィンドウ経過後もユーザーのエントリ自体は残り続ける
        // given (前提条件):
        let (limiter, clock) = limiter();
        limiter.can_send(&user("alice"), MAX, WINDOW);
        limiter.can_send(&user("bob"), MAX, WINDOW);

        // when (操作):
        clock.advance(TimeDelta::seconds(60));

        // then (期待する結果):
        assert_eq!(limiter.tracked_users(), 2);
    }

    #[test]
    fn test_concurrent_sends_never_exceed_max() {
        // テスト項目: 同一ユーザーが並行に送信しても受理数は上限を超えない
        // given (前提条件):
        let (limiter, _clock) = limiter();
        let limiter = Arc::new(limiter);
        let alice = user("alice");

        // when (操作):
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                let alice = alice.clone();
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|_| limiter.can_send(&alice, MAX, WINDOW))
                        .count()
                })
            })
            .collect();
        let accepted: usize = threads.into_iter().map(|t| t.join().unwrap()).sum();

        // then (期待する結果):
        assert_eq!(accepted, MAX);
    }
}
