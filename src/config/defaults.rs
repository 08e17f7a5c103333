//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::SocketAddr;

// =============================================================================
// HTTP Defaults
// =============================================================================

pub fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

pub fn default_theme() -> String {
    "dark".to_string()
}

/// Cache lifetime when no refresh interval is configured.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5;

/// Client refresh hint when the configured interval is missing or zero.
pub const FALLBACK_REFRESH_SECS: u64 = 60;

// =============================================================================
// ServerQuery Defaults
// =============================================================================

pub const SSH_QUERY_PORT: u16 = 10022;
pub const RAW_QUERY_PORT: u16 = 10011;

pub fn default_server_id() -> String {
    "1".to_string()
}

pub fn default_keepalive_secs() -> u64 {
    30
}
