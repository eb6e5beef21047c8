//! # Proxy Collaborators
//!
//! The query responder reads live proxy state through these traits and never
//! owns it. The proxy supplies implementations; [`ProxySettings`] from the
//! configuration module implements [`ProxyInfo`] for deployments that read
//! everything from the config file.
//!
//! [`ProxySettings`]: crate::config::ProxySettings

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Static proxy facts and display settings
pub trait ProxyInfo: Send + Sync {
    /// Address the game listener is bound to (reported as `hostip`/`hostport`)
    fn bind_address(&self) -> SocketAddr;

    /// Message of the day as rich text
    fn motd(&self) -> String;

    /// Map label
    fn map_name(&self) -> String;

    /// Capacity shown to queriers
    fn show_max_players(&self) -> u32;

    /// Whether full replies list installed plugins
    fn show_plugins(&self) -> bool;

    /// Proxy brand reported in the `plugins` entry
    fn brand(&self) -> String;

    /// Supported game version range, e.g. `"1.13-1.14"`
    fn game_version(&self) -> String;
}

/// Live player registry
pub trait PlayerRegistry: Send + Sync {
    fn player_count(&self) -> usize;

    /// Usernames of every connected player
    fn usernames(&self) -> Vec<String>;
}

/// Description of an installed plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescription {
    pub id: String,
    pub name: Option<String>,
    pub version: Option<String>,
}

impl PluginDescription {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            version: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Installed-plugin registry
pub trait PluginRegistry: Send + Sync {
    fn plugins(&self) -> Vec<PluginDescription>;
}

impl PluginRegistry for Vec<PluginDescription> {
    fn plugins(&self) -> Vec<PluginDescription> {
        self.clone()
    }
}

/// A player list the proxy updates in place
#[derive(Debug, Default, Clone)]
pub struct SharedPlayerList {
    players: Arc<RwLock<Vec<String>>>,
}

impl SharedPlayerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, username: impl Into<String>) {
        if let Ok(mut players) = self.players.write() {
            players.push(username.into());
        }
    }

    /// Remove a player by name; returns true if they were listed
    pub fn remove(&self, username: &str) -> bool {
        match self.players.write() {
            Ok(mut players) => {
                let before = players.len();
                players.retain(|p| p != username);
                players.len() != before
            }
            Err(_) => false,
        }
    }
}

impl PlayerRegistry for SharedPlayerList {
    fn player_count(&self) -> usize {
        self.players.read().map(|p| p.len()).unwrap_or(0)
    }

    fn usernames(&self) -> Vec<String> {
        self.players.read().map(|p| p.clone()).unwrap_or_default()
    }
}
