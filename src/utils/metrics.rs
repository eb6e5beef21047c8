//! Observability and Metrics
//!
//! Counters for query traffic: accepted handshakes and stats, rejections by
//! cause, hook replacements and replies written.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

use crate::protocol::response::QueryKind;

/// Metrics collector for one query responder
#[derive(Debug)]
pub struct QueryMetrics {
    /// Datagrams received
    pub datagrams_received: AtomicU64,
    /// Bytes received
    pub bytes_received: AtomicU64,
    /// Handshakes answered
    pub handshakes: AtomicU64,
    /// Basic stat requests accepted
    pub stats_basic: AtomicU64,
    /// Full stat requests accepted
    pub stats_full: AtomicU64,
    /// Datagrams rejected as malformed
    pub malformed: AtomicU64,
    /// Stat requests rejected for a bad or expired token
    pub invalid_challenge: AtomicU64,
    /// Responses replaced by the query hook
    pub hook_replaced: AtomicU64,
    /// Datagrams dropped because too many replies were in flight
    pub dropped_backpressure: AtomicU64,
    /// Handler failures outside the protocol rejections
    pub internal_errors: AtomicU64,
    /// Replies written to the socket
    pub replies_sent: AtomicU64,
    /// Socket send failures
    pub send_errors: AtomicU64,
    /// Requests whose handling or hook panicked
    pub panics: AtomicU64,
    start_time: Instant,
}

impl QueryMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            datagrams_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            handshakes: AtomicU64::new(0),
            stats_basic: AtomicU64::new(0),
            stats_full: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            invalid_challenge: AtomicU64::new(0),
            hook_replaced: AtomicU64::new(0),
            dropped_backpressure: AtomicU64::new(0),
            internal_errors: AtomicU64::new(0),
            replies_sent: AtomicU64::new(0),
            send_errors: AtomicU64::new(0),
            panics: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an inbound datagram
    pub fn datagram_received(&self, byte_count: u64) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn handshake(&self) {
        self.handshakes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an accepted stat request
    pub fn stat(&self, kind: QueryKind) {
        match kind {
            QueryKind::Basic => self.stats_basic.fetch_add(1, Ordering::Relaxed),
            QueryKind::Full => self.stats_full.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn invalid_challenge(&self) {
        self.invalid_challenge.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hook_replaced(&self) {
        self.hook_replaced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_backpressure(&self) {
        self.dropped_backpressure.fetch_add(1, Ordering::Relaxed);
    }

    pub fn internal_error(&self) {
        self.internal_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reply written to the socket
    pub fn reply_sent(&self) {
        self.replies_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn send_error(&self) {
        self.send_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn panicked(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            handshakes: self.handshakes.load(Ordering::Relaxed),
            stats_basic: self.stats_basic.load(Ordering::Relaxed),
            stats_full: self.stats_full.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            invalid_challenge: self.invalid_challenge.load(Ordering::Relaxed),
            hook_replaced: self.hook_replaced.load(Ordering::Relaxed),
            dropped_backpressure: self.dropped_backpressure.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            datagrams_received = snapshot.datagrams_received,
            bytes_received = snapshot.bytes_received,
            handshakes = snapshot.handshakes,
            stats_basic = snapshot.stats_basic,
            stats_full = snapshot.stats_full,
            malformed = snapshot.malformed,
            invalid_challenge = snapshot.invalid_challenge,
            hook_replaced = snapshot.hook_replaced,
            dropped_backpressure = snapshot.dropped_backpressure,
            internal_errors = snapshot.internal_errors,
            replies_sent = snapshot.replies_sent,
            send_errors = snapshot.send_errors,
            panics = snapshot.panics,
            uptime_seconds = snapshot.uptime_seconds,
            "Query metrics snapshot"
        );
    }
}

impl Default for QueryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub datagrams_received: u64,
    pub bytes_received: u64,
    pub handshakes: u64,
    pub stats_basic: u64,
    pub stats_full: u64,
    pub malformed: u64,
    pub invalid_challenge: u64,
    pub hook_replaced: u64,
    pub dropped_backpressure: u64,
    pub internal_errors: u64,
    pub replies_sent: u64,
    pub send_errors: u64,
    pub panics: u64,
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    /// Datagrams rejected for any protocol reason
    pub fn rejected(&self) -> u64 {
        self.malformed + self.invalid_challenge
    }
}
