//! # Utility Modules
//!
//! Supporting utilities shared by the handler and the transport.
//!
//! ## Components
//! - **Logging**: `tracing-subscriber` setup from [`LoggingConfig`](crate::config::LoggingConfig)
//! - **Metrics**: Thread-safe query counters

pub mod logging;
pub mod metrics;

pub use metrics::{MetricsSnapshot, QueryMetrics};
