//! # Error Types
//!
//! Error handling for the query responder.
//!
//! The protocol has no error reply format, so the two protocol rejections
//! ([`QueryError::MalformedPacket`] and [`QueryError::InvalidChallenge`]) are
//! terminal: the datagram is dropped, the peer sees no reply, and the failure
//! is only logged locally. The remaining variants cover the socket and
//! configuration layers around the handler.
//!
//! ## Example Usage
//! ```rust
//! use gs4_query::core::packet;
//! use gs4_query::error::QueryError;
//! use tracing::debug;
//!
//! match packet::decode(&[0xFE, 0xFD]) {
//!     Ok(request) => debug!(?request, "decoded"),
//!     Err(e @ QueryError::MalformedPacket(_)) => debug!(error = %e, "dropped"),
//!     Err(e) => panic!("unexpected error: {e}"),
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Static reason strings, borrowed to keep the rejection path allocation-free.
pub mod constants {
    /// Framing rejections
    pub const ERR_TOO_SHORT: &str = "packet shorter than the 7-byte header";
    pub const ERR_BAD_MAGIC: &str = "invalid query packet magic";
    pub const ERR_UNKNOWN_TYPE: &str = "unknown query packet type";
    pub const ERR_MISSING_TOKEN: &str = "stat request without challenge token";
    pub const ERR_TRAILING_BYTES: &str = "stat request with unexpected trailing bytes";
}

// QueryError is the primary error type for all query operations
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum QueryError {
    #[error("Malformed query packet: {0}")]
    #[serde(skip_deserializing)]
    MalformedPacket(&'static str),

    #[error("Invalid challenge token")]
    InvalidChallenge,

    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Synchronization primitive poisoned")]
    LockPoisoned,
}

impl QueryError {
    /// True for the protocol rejections that are silently dropped on the wire.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            QueryError::MalformedPacket(_) | QueryError::InvalidChallenge
        )
    }
}

/// Type alias for Results using QueryError
pub type Result<T> = std::result::Result<T, QueryError>;
