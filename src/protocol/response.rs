//! The neutral query response value.
//!
//! [`QueryResponse`] is immutable once built. Hooks that want to change what
//! is advertised take a copy through [`QueryResponse::to_builder`] and return
//! a new value.

use serde::{Deserialize, Serialize};

/// Which stat layout a request asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKind {
    Basic,
    Full,
}

/// A plugin as advertised in full stat replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    name: String,
    version: Option<String>,
}

impl PluginInfo {
    pub fn new(name: impl Into<String>, version: Option<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            version: version.map(Into::into),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

/// Everything a stat reply advertises
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    hostname: String,
    game_version: String,
    map: String,
    current_players: u32,
    max_players: u32,
    proxy_port: u16,
    proxy_host: String,
    players: Vec<String>,
    proxy_version: String,
    plugins: Vec<PluginInfo>,
}

impl QueryResponse {
    pub fn builder() -> QueryResponseBuilder {
        QueryResponseBuilder::default()
    }

    /// Builder pre-filled with this response's values
    pub fn to_builder(&self) -> QueryResponseBuilder {
        QueryResponseBuilder {
            hostname: self.hostname.clone(),
            game_version: self.game_version.clone(),
            map: self.map.clone(),
            current_players: self.current_players,
            max_players: self.max_players,
            proxy_port: self.proxy_port,
            proxy_host: self.proxy_host.clone(),
            players: self.players.clone(),
            proxy_version: self.proxy_version.clone(),
            plugins: self.plugins.clone(),
        }
    }

    /// Plain-text server description
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn game_version(&self) -> &str {
        &self.game_version
    }

    pub fn map(&self) -> &str {
        &self.map
    }

    pub fn current_players(&self) -> u32 {
        self.current_players
    }

    pub fn max_players(&self) -> u32 {
        self.max_players
    }

    pub fn proxy_port(&self) -> u16 {
        self.proxy_port
    }

    pub fn proxy_host(&self) -> &str {
        &self.proxy_host
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    /// Proxy brand and version, e.g. `"Velocity"`
    pub fn proxy_version(&self) -> &str {
        &self.proxy_version
    }

    pub fn plugins(&self) -> &[PluginInfo] {
        &self.plugins
    }
}

/// Builder for [`QueryResponse`]
#[derive(Debug, Clone, Default)]
pub struct QueryResponseBuilder {
    hostname: String,
    game_version: String,
    map: String,
    current_players: u32,
    max_players: u32,
    proxy_port: u16,
    proxy_host: String,
    players: Vec<String>,
    proxy_version: String,
    plugins: Vec<PluginInfo>,
}

impl QueryResponseBuilder {
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn game_version(mut self, game_version: impl Into<String>) -> Self {
        self.game_version = game_version.into();
        self
    }

    pub fn map(mut self, map: impl Into<String>) -> Self {
        self.map = map.into();
        self
    }

    pub fn current_players(mut self, current_players: u32) -> Self {
        self.current_players = current_players;
        self
    }

    pub fn max_players(mut self, max_players: u32) -> Self {
        self.max_players = max_players;
        self
    }

    pub fn proxy_port(mut self, proxy_port: u16) -> Self {
        self.proxy_port = proxy_port;
        self
    }

    pub fn proxy_host(mut self, proxy_host: impl Into<String>) -> Self {
        self.proxy_host = proxy_host.into();
        self
    }

    /// Append players to the list
    pub fn players<I, S>(mut self, players: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.players.extend(players.into_iter().map(Into::into));
        self
    }

    pub fn clear_players(mut self) -> Self {
        self.players.clear();
        self
    }

    pub fn proxy_version(mut self, proxy_version: impl Into<String>) -> Self {
        self.proxy_version = proxy_version.into();
        self
    }

    /// Append plugins to the list
    pub fn plugins<I>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = PluginInfo>,
    {
        self.plugins.extend(plugins);
        self
    }

    pub fn clear_plugins(mut self) -> Self {
        self.plugins.clear();
        self
    }

    pub fn build(self) -> QueryResponse {
        QueryResponse {
            hostname: self.hostname,
            game_version: self.game_version,
            map: self.map,
            current_players: self.current_players,
            max_players: self.max_players,
            proxy_port: self.proxy_port,
            proxy_host: self.proxy_host,
            players: self.players,
            proxy_version: self.proxy_version,
            plugins: self.plugins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_builder_copies_then_replaces() {
        let original = QueryResponse::builder()
            .hostname("A server")
            .map("world")
            .players(["alice", "bob"])
            .plugins([PluginInfo::new("Auth", Some("2.1"))])
            .build();

        let replaced = original
            .to_builder()
            .clear_players()
            .players(["carol"])
            .map("nether")
            .build();

        assert_eq!(original.players(), ["alice", "bob"]);
        assert_eq!(original.map(), "world");
        assert_eq!(replaced.players(), ["carol"]);
        assert_eq!(replaced.map(), "nether");
        assert_eq!(replaced.hostname(), "A server");
        assert_eq!(replaced.plugins(), original.plugins());
    }

    #[test]
    fn test_plugin_info_version_optional() {
        let plugin = PluginInfo::new("B", None::<String>);
        assert_eq!(plugin.name(), "B");
        assert_eq!(plugin.version(), None);
    }
}
