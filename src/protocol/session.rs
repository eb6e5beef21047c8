//! # Challenge Session Store
//!
//! Maps a peer host (IP address, port ignored) to its outstanding challenge
//! token. A handshake overwrites the peer's entry and restarts its expiry
//! window; stat requests only read it.
//!
//! ## Expiry
//! Entries are checked against the TTL on every read, so an entry older than
//! the window is unreadable even if it has not been swept yet. Expired
//! entries are swept lazily from [`ChallengeStore::issue`] at most once per
//! TTL window.
//!
//! ## Concurrency
//! One mutex guards the map; every operation touches a single key, which is
//! all the atomicity the handshake/stat flow needs. A handshake racing a stat
//! request from the same host is not serialized: the last handshake write
//! wins and the concurrent stat may observe either token.
//!
//! The clock is `tokio::time::Instant`, so tests on a paused runtime can move
//! the store's clock with `tokio::time::advance`.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::{QueryError, Result};

/// Default lifetime of a challenge token
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30);

/// An outstanding challenge for one peer host
#[derive(Clone, Copy, Debug)]
struct Session {
    challenge_token: i32,
    created_at: Instant,
}

impl Session {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }
}

struct StoreInner {
    sessions: HashMap<IpAddr, Session>,
    last_sweep: Instant,
    total_issued: u64,
}

/// Thread-safe, time-bounded challenge token store
pub struct ChallengeStore {
    ttl: Duration,
    inner: Mutex<StoreInner>,
}

impl ChallengeStore {
    /// Create a store whose tokens live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(StoreInner {
                sessions: HashMap::new(),
                last_sweep: Instant::now(),
                total_issued: 0,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a fresh token for `peer`, replacing any previous one.
    pub fn issue(&self, peer: IpAddr) -> Result<i32> {
        let challenge_token: i32 = rand::rng().random();
        let now = Instant::now();

        let mut inner = self.lock()?;
        if now.saturating_duration_since(inner.last_sweep) >= self.ttl {
            self.evict_expired_locked(&mut inner, now);
            inner.last_sweep = now;
        }

        inner.sessions.insert(
            peer,
            Session {
                challenge_token,
                created_at: now,
            },
        );
        inner.total_issued += 1;

        trace!(%peer, session_count = inner.sessions.len(), "Challenge token issued");
        Ok(challenge_token)
    }

    /// True iff `peer` holds an unexpired token equal to `presented`.
    ///
    /// Neither consumes nor refreshes the entry.
    pub fn validate(&self, peer: IpAddr, presented: i32) -> Result<bool> {
        let now = Instant::now();
        let inner = self.lock()?;

        Ok(inner
            .sessions
            .get(&peer)
            .filter(|session| !session.is_expired(now, self.ttl))
            .is_some_and(|session| session.challenge_token == presented))
    }

    /// Drop every expired entry now
    pub fn evict_expired(&self) -> Result<usize> {
        let now = Instant::now();
        let mut inner = self.lock()?;
        let removed = self.evict_expired_locked(&mut inner, now);
        inner.last_sweep = now;
        Ok(removed)
    }

    /// Number of entries held, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.sessions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get current store statistics
    pub fn stats(&self) -> Result<SessionStats> {
        let now = Instant::now();
        let inner = self.lock()?;

        let expired_count = inner
            .sessions
            .values()
            .filter(|session| session.is_expired(now, self.ttl))
            .count();

        Ok(SessionStats {
            total_entries: inner.sessions.len(),
            expired_count,
            total_issued: inner.total_issued,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>> {
        self.inner.lock().map_err(|_| QueryError::LockPoisoned)
    }

    fn evict_expired_locked(&self, inner: &mut StoreInner, now: Instant) -> usize {
        let before = inner.sessions.len();
        inner
            .sessions
            .retain(|_, session| !session.is_expired(now, self.ttl));
        let removed = before - inner.sessions.len();

        if removed > 0 {
            debug!(
                removed_count = removed,
                remaining_count = inner.sessions.len(),
                "Expired challenge sessions evicted"
            );
        }
        removed
    }
}

impl Default for ChallengeStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

/// Statistics about the session store
#[derive(Debug, Clone, Copy)]
pub struct SessionStats {
    /// Entries currently held
    pub total_entries: usize,
    /// Entries past their TTL but not yet swept
    pub expired_count: usize,
    /// Tokens ever issued
    pub total_issued: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn peer(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[tokio::test(start_paused = true)]
    async fn test_issue_then_validate() {
        let store = ChallengeStore::default();
        let token = store.issue(peer(1)).unwrap();

        assert!(store.validate(peer(1), token).unwrap());
        assert!(!store.validate(peer(1), token.wrapping_sub(1)).unwrap());
        assert!(!store.validate(peer(2), token).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_peers_hold_independent_tokens() {
        let store = ChallengeStore::default();
        let a = store.issue(peer(1)).unwrap();
        let b = store.issue(peer(2)).unwrap();

        assert!(store.validate(peer(1), a).unwrap());
        assert!(store.validate(peer(2), b).unwrap());
        if a != b {
            assert!(!store.validate(peer(1), b).unwrap());
            assert!(!store.validate(peer(2), a).unwrap());
        }
        assert_eq!(store.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_expires() {
        let store = ChallengeStore::default();
        let token = store.issue(peer(1)).unwrap();

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(store.validate(peer(1), token).unwrap());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!store.validate(peer(1), token).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_does_not_refresh() {
        let store = ChallengeStore::default();
        let token = store.issue(peer(1)).unwrap();

        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(7)).await;
            let _ = store.validate(peer(1), token).unwrap();
        }
        assert!(!store.validate(peer(1), token).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reissue_overwrites_and_restarts_window() {
        let store = ChallengeStore::default();
        let first = store.issue(peer(1)).unwrap();

        tokio::time::advance(Duration::from_secs(20)).await;
        let second = store.issue(peer(1)).unwrap();
        assert_eq!(store.len(), 1);
        if first != second {
            assert!(!store.validate(peer(1), first).unwrap());
        }

        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(store.validate(peer(1), second).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_sweep_on_issue() {
        let store = ChallengeStore::default();
        store.issue(peer(1)).unwrap();
        store.issue(peer(2)).unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        let stats = store.stats().unwrap();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_count, 2);

        store.issue(peer(3)).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_issued, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_eviction() {
        let store = ChallengeStore::new(Duration::from_secs(5));
        store.issue(peer(1)).unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(store.evict_expired().unwrap(), 1);
        assert!(store.is_empty());
    }
}
