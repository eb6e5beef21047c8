//! # Configuration Management
//!
//! Settings for the query listener, the proxy facts it reports, and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - `GS4_QUERY_*` environment overrides via `from_env()`
//!
//! Durations are written in milliseconds and log levels as lowercase strings.

use crate::error::{QueryError, Result};
use crate::protocol::session::DEFAULT_SESSION_TTL;
use crate::service::ProxyInfo;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Default port for both the game listener and the query socket
pub const DEFAULT_PORT: u16 = 25577;

/// Default bound on replies awaiting their hook per socket
pub const DEFAULT_MAX_PENDING_REPLIES: usize = 256;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct QueryConfig {
    /// Query listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Proxy facts reported in stat replies
    #[serde(default)]
    pub proxy: ProxySettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl QueryConfig {
    /// Read a TOML file; missing sections take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            QueryError::ConfigError(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| QueryError::ConfigError(format!("Invalid TOML: {e}")))
    }

    /// Defaults overridden by `GS4_QUERY_*` environment variables.
    ///
    /// Values that fail to parse are reported instead of silently ignored.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("GS4_QUERY_ADDRESS") {
            config.server.address = addr;
        }

        if let Some(ms) = env_parsed::<u64>("GS4_QUERY_SESSION_TTL_MS")? {
            config.server.session_ttl = Duration::from_millis(ms);
        }

        if let Some(limit) = env_parsed::<usize>("GS4_QUERY_MAX_PENDING_REPLIES")? {
            config.server.max_pending_replies = limit;
        }

        if let Some(bind) = env_parsed::<SocketAddr>("GS4_QUERY_PROXY_BIND")? {
            config.proxy.bind = bind;
        }

        if let Ok(motd) = std::env::var("GS4_QUERY_MOTD") {
            config.proxy.motd = motd;
        }

        if let Some(max) = env_parsed::<u32>("GS4_QUERY_SHOW_MAX_PLAYERS")? {
            config.proxy.show_max_players = max;
        }

        if let Some(show) = env_parsed::<bool>("GS4_QUERY_SHOW_PLUGINS")? {
            config.proxy.show_plugins = show;
        }

        if let Some(level) = env_parsed::<Level>("GS4_QUERY_LOG_LEVEL")? {
            config.logging.log_level = level;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// The default configuration rendered as TOML
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| QueryError::ConfigError(format!("Cannot render config: {e}")))?;
        std::fs::write(path, content).map_err(|e| {
            QueryError::ConfigError(format!("Cannot write {}: {e}", path.display()))
        })
    }

    /// Every problem found, empty when the configuration is usable
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.proxy.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// [`validate`](Self::validate) folded into one `ConfigError`
    pub fn validate_strict(&self) -> Result<()> {
        match self.validate().as_slice() {
            [] => Ok(()),
            problems => Err(QueryError::ConfigError(format!(
                "Invalid configuration: {}",
                problems.join("; ")
            ))),
        }
    }
}

fn env_parsed<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| QueryError::ConfigError(format!("Invalid value for {key}: '{raw}' ({e})"))),
        Err(_) => Ok(None),
    }
}

/// Query listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// UDP address the query socket binds (e.g., "0.0.0.0:25577")
    pub address: String,

    /// How long an issued challenge token stays valid
    #[serde(with = "duration_serde")]
    pub session_ttl: Duration,

    /// Maximum number of replies in flight per socket
    pub max_pending_replies: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_PORT).to_string(),
            session_ttl: DEFAULT_SESSION_TTL,
            max_pending_replies: DEFAULT_MAX_PENDING_REPLIES,
        }
    }
}

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Server address cannot be empty".to_string());
        } else if self.address.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid server address format: '{}' (expected format: '0.0.0.0:25577')",
                self.address
            ));
        }

        if self.session_ttl.as_secs() < 1 {
            errors.push("Session TTL too short (minimum: 1s)".to_string());
        } else if self.session_ttl.as_secs() > 3600 {
            errors.push("Session TTL too long (maximum: 1 hour)".to_string());
        }

        if self.max_pending_replies == 0 {
            errors.push("Max pending replies must be greater than 0".to_string());
        } else if self.max_pending_replies > 1_000_000 {
            errors.push(format!(
                "Max pending replies too large: {} (max recommended: 1,000,000)",
                self.max_pending_replies
            ));
        }

        errors
    }
}

/// Proxy facts read from configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProxySettings {
    /// Game listener address, reported as `hostip`/`hostport`
    pub bind: SocketAddr,

    /// Message of the day; legacy `&` codes or a JSON chat component
    pub motd: String,

    pub map: String,

    pub show_max_players: u32,

    /// List installed plugins in full replies
    pub show_plugins: bool,

    pub brand: String,

    pub game_version: String,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            motd: String::from("&3A Velocity Server"),
            map: String::from("Velocity"),
            show_max_players: 500,
            show_plugins: false,
            brand: String::from("Velocity"),
            game_version: String::from("1.13-1.14"),
        }
    }
}

impl ProxySettings {
    /// Validate proxy settings
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.bind.port() == 0 {
            errors.push("Proxy bind port cannot be 0".to_string());
        }

        if self.brand.is_empty() {
            errors.push("Proxy brand cannot be empty".to_string());
        }

        if self.game_version.is_empty() {
            errors.push("Game version cannot be empty".to_string());
        }

        errors
    }
}

impl ProxyInfo for ProxySettings {
    fn bind_address(&self) -> SocketAddr {
        self.bind
    }

    fn motd(&self) -> String {
        self.motd.clone()
    }

    fn map_name(&self) -> String {
        self.map.clone()
    }

    fn show_max_players(&self) -> u32 {
        self.show_max_players
    }

    fn show_plugins(&self) -> bool {
        self.show_plugins
    }

    fn brand(&self) -> String {
        self.brand.clone()
    }

    fn game_version(&self) -> String {
        self.game_version.clone()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("gs4-query"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Problems with the logging outputs
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.trim().is_empty() {
            errors.push("Logging app_name is blank".to_string());
        }

        match (self.log_to_file, self.log_file_path.as_deref()) {
            (true, None) => {
                errors.push("log_to_file is set but log_file_path is missing".to_string())
            }
            (true, Some(path)) => {
                let dir = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty());
                if let Some(dir) = dir.filter(|d| !d.is_dir()) {
                    errors.push(format!("Log directory {} is not a directory", dir.display()));
                }
            }
            (false, _) => {}
        }

        if !self.log_to_console && !self.log_to_file {
            errors.push("Logging has no output: enable log_to_console or log_to_file".to_string());
        }

        errors
    }
}

/// Durations as whole milliseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// `tracing::Level` as a lowercase name
mod log_level_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use tracing::Level;

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.as_str().to_ascii_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse::<Level>()
            .map_err(|_| D::Error::custom(format!("Unknown log level '{name}'")))
    }
}
