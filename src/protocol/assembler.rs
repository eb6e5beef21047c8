//! Response assembly from live proxy state.
//!
//! Every call reads the collaborators afresh, so the player list in a
//! response is a snapshot taken at build time. The plugin list is different:
//! it is computed on first use and frozen for the life of the assembler,
//! even if plugins are later added or removed or listing is toggled.

use std::net::IpAddr;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::protocol::response::{PluginInfo, QueryKind, QueryResponse};
use crate::protocol::text;
use crate::service::{PlayerRegistry, PluginRegistry, ProxyInfo};

/// Builds [`QueryResponse`] values from the proxy's collaborators
pub struct ResponseAssembler {
    proxy: Arc<dyn ProxyInfo>,
    players: Arc<dyn PlayerRegistry>,
    plugins: Arc<dyn PluginRegistry>,
    plugin_cache: OnceLock<Arc<[PluginInfo]>>,
}

impl ResponseAssembler {
    pub fn new(
        proxy: Arc<dyn ProxyInfo>,
        players: Arc<dyn PlayerRegistry>,
        plugins: Arc<dyn PluginRegistry>,
    ) -> Self {
        Self {
            proxy,
            players,
            plugins,
            plugin_cache: OnceLock::new(),
        }
    }

    /// Build the response for one accepted stat request.
    pub fn build(&self, kind: QueryKind, peer: IpAddr) -> QueryResponse {
        let bind = self.proxy.bind_address();
        let current_players = u32::try_from(self.players.player_count()).unwrap_or(u32::MAX);

        let plugins: Vec<PluginInfo> = if self.proxy.show_plugins() {
            self.plugin_list().to_vec()
        } else {
            Vec::new()
        };

        debug!(%peer, ?kind, current_players, "Assembling query response");

        QueryResponse::builder()
            .hostname(text::to_plain(&self.proxy.motd()))
            .game_version(self.proxy.game_version())
            .map(self.proxy.map_name())
            .current_players(current_players)
            .max_players(self.proxy.show_max_players())
            .proxy_port(bind.port())
            .proxy_host(bind.ip().to_string())
            .players(self.players.usernames())
            .proxy_version(self.proxy.brand())
            .plugins(plugins)
            .build()
    }

    /// Installed plugins, computed once; concurrent first callers block on
    /// the single computation.
    pub fn plugin_list(&self) -> Arc<[PluginInfo]> {
        self.plugin_cache
            .get_or_init(|| {
                let list: Vec<PluginInfo> = self
                    .plugins
                    .plugins()
                    .iter()
                    .map(|desc| PluginInfo::new(desc.display_name(), desc.version.clone()))
                    .collect();
                debug!(plugin_count = list.len(), "Plugin list cached for query replies");
                list.into()
            })
            .clone()
    }
}
