//! Subscriber setup from [`LoggingConfig`].
//!
//! `RUST_LOG` takes precedence over the configured level when set.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::{QueryError, Result};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global subscriber.
///
/// The returned guards flush buffered output when dropped; hold them for the
/// lifetime of the program.
pub fn init_logging(config: &LoggingConfig) -> Result<Vec<WorkerGuard>> {
    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.log_to_console {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        guards.push(guard);
        layers.push(fmt_layer(writer, config.json_format, true));
    }

    if config.log_to_file {
        let path = config.log_file_path.as_deref().ok_or_else(|| {
            QueryError::ConfigError("log_file_path must be set when log_to_file is true".into())
        })?;
        let path = Path::new(path);
        let file_name = path
            .file_name()
            .ok_or_else(|| QueryError::ConfigError(format!("Invalid log file path: {}", path.display())))?;
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));

        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        guards.push(guard);
        layers.push(fmt_layer(writer, config.json_format, false));
    }

    let filter = EnvFilter::builder()
        .with_default_directive(config.log_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| QueryError::ConfigError(format!("Failed to install log subscriber: {e}")))?;

    tracing::info!(app = %config.app_name, level = %config.log_level, "Logging initialised");
    Ok(guards)
}

fn fmt_layer<W>(writer: W, json: bool, ansi: bool) -> BoxedLayer
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true);

    if json {
        layer.json().boxed()
    } else {
        layer.with_ansi(ansi).boxed()
    }
}
