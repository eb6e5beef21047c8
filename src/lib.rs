//! # gs4-query
//!
//! GameSpy4 (GS4) UDP query responder for proxy servers.
//!
//! A querier first sends a handshake and receives a challenge token bound to
//! its IP address; it then presents the token in a stat request and receives
//! either the basic or the full server status. Invalid input is dropped
//! without a reply.
//!
//! ## Layout
//! - [`core`]: wire constants, request decoding, reply encoding
//! - [`protocol`]: challenge sessions, response assembly, the query handler
//! - [`service`]: traits through which live proxy state is read
//! - [`transport`]: the UDP listener
//! - [`config`], [`error`], [`utils`]: configuration, errors, logging and metrics
//!
//! ## Quick start
//! ```no_run
//! use std::sync::Arc;
//! use gs4_query::config::QueryConfig;
//! use gs4_query::protocol::{ChallengeStore, QueryHandler, ResponseAssembler};
//! use gs4_query::service::{PluginDescription, SharedPlayerList};
//!
//! # async fn run() -> gs4_query::Result<()> {
//! let config = QueryConfig::from_env()?;
//! config.validate_strict()?;
//!
//! let assembler = ResponseAssembler::new(
//!     Arc::new(config.proxy.clone()),
//!     Arc::new(SharedPlayerList::new()),
//!     Arc::new(Vec::<PluginDescription>::new()),
//! );
//! let handler = QueryHandler::new(ChallengeStore::new(config.server.session_ttl), assembler);
//!
//! gs4_query::transport::udp::start_server(&config, Arc::new(handler)).await
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use error::{QueryError, Result};
pub use protocol::{QueryHandler, QueryHook, QueryKind, QueryResponse};
