//! # Transport Layer
//!
//! Socket loops that drive the [`QueryHandler`](crate::protocol::QueryHandler).
//!
//! ## Components
//! - **UDP**: Single-task listener with in-order reply delivery

pub mod udp;
