//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Viewer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP surface.
    #[serde(default)]
    pub http: HttpConfig,
    /// ServerQuery connection.
    pub teamspeak: TeamspeakConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// HTTP listener and page settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Address to bind (default: 0.0.0.0:8080).
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Link shown as "connect" on the page (e.g. `ts3server://ts.example.org`).
    #[serde(default)]
    pub host_connection_link: String,
    /// Theme name passed through to the page.
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Seconds between page refreshes; also the cache lifetime.
    #[serde(default)]
    pub refresh_interval: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            host_connection_link: String::new(),
            theme: default_theme(),
            refresh_interval: None,
        }
    }
}

impl HttpConfig {
    /// How long a fetched snapshot is served from cache.
    ///
    /// Follows `refresh_interval` when set (zero disables caching), otherwise 5 s.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.unwrap_or(DEFAULT_CACHE_TTL_SECS))
    }

    /// Refresh hint sent to clients; missing or zero falls back to 60 s.
    pub fn refresh_hint(&self) -> u64 {
        self.refresh_interval
            .filter(|&secs| secs > 0)
            .unwrap_or(FALLBACK_REFRESH_SECS)
    }
}

/// How the query interface is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryTransport {
    /// ServerQuery over SSH.
    #[default]
    Ssh,
    /// Plain-text ServerQuery over TCP.
    Raw,
}

/// ServerQuery connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamspeakConfig {
    /// Query host name or address.
    pub host: String,
    /// Query port (default: 10022 for ssh, 10011 for raw).
    pub port: Option<u16>,
    /// Query login name.
    #[serde(default)]
    pub user: String,
    /// Query password.
    #[serde(default)]
    pub password: String,
    /// Virtual server id selected after login (default: "1").
    #[serde(default = "default_server_id")]
    pub server_id: String,
    /// Request voice fields (`clientlist -voice`).
    #[serde(default)]
    pub enable_voice_status: bool,
    /// Transport (default: ssh).
    #[serde(default)]
    pub transport: QueryTransport,
    /// Seconds between keepalive commands; 0 disables (default: 30).
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    /// Upper bound on a single command round trip. Unset waits indefinitely.
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
}

impl TeamspeakConfig {
    /// Configured port, or the default for the transport.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(match self.transport {
            QueryTransport::Ssh => SSH_QUERY_PORT,
            QueryTransport::Raw => RAW_QUERY_PORT,
        })
    }

    /// Keepalive period, `None` when disabled.
    pub fn keepalive_interval(&self) -> Option<Duration> {
        (self.keepalive_secs > 0).then(|| Duration::from_secs(self.keepalive_secs))
    }

    /// Per-command deadline, `None` when unset or zero.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }
}
