//! # Query Protocol
//!
//! Everything between a decoded datagram and the reply to encode.
//!
//! ## Components
//! - **Session**: Challenge tokens per source address with a fixed lifetime
//! - **Response**: The immutable stat payload and its builder
//! - **Assembler**: Builds responses from live proxy state
//! - **Handler**: Per-datagram state machine and the mutation hook
//! - **Text**: Rich-text MOTD flattening

pub mod assembler;
pub mod handler;
pub mod response;
pub mod session;
pub mod text;

pub use assembler::ResponseAssembler;
pub use handler::{NoopHook, PendingReply, QueryHandler, QueryHook, Reply};
pub use response::{PluginInfo, QueryKind, QueryResponse, QueryResponseBuilder};
pub use session::{ChallengeStore, SessionStats};
