use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use saferoute_core::RouterConfig;
use serde::Deserialize;

/// Server settings, read from TOML:
///
/// ```toml
/// listen = "127.0.0.1:5000"
/// concurrency_limit = 64
/// request_timeout_ms = 10000
///
/// [router]
/// graph_path = "graph.json"
/// max_snap_distance_m = 1000.0
/// search_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Maximum number of requests processed at once
    pub concurrency_limit: usize,
    /// Whole-request deadline enforced by the HTTP layer
    pub request_timeout_ms: u64,
    pub router: RouterConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 5000)),
            concurrency_limit: 64,
            request_timeout_ms: 10_000,
            router: RouterConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
