//! `serverinfo` record.

use crate::response::Record;

/// Aggregate counters of the selected virtual server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ServerInfo {
    /// Virtual server id.
    pub server_id: String,
    /// Display name.
    pub name: String,
    /// Uptime in seconds, as reported.
    pub uptime: String,
    /// Clients online, excluding this query connection.
    pub clients_online: String,
    /// Slot count.
    pub max_clients: String,
    /// Channel count.
    pub channels_online: String,
    /// Banner link target.
    pub host_banner_url: String,
    /// Banner image.
    pub host_banner_gfx_url: String,
    /// Required identity security level.
    pub needed_identity_security_level: String,
    /// Total query connections since start.
    pub query_client_connections: String,
    /// Total client connections since start.
    pub client_connections: String,
}

impl ServerInfo {
    /// Read the known `virtualserver_*` keys.
    pub fn from_record(record: &Record) -> Self {
        Self {
            server_id: record.get_or_default("virtualserver_id"),
            name: record.get_or_default("virtualserver_name"),
            uptime: record.get_or_default("virtualserver_uptime"),
            clients_online: adjust_clients_online(
                record.get("virtualserver_clientsonline").unwrap_or_default(),
            ),
            max_clients: record.get_or_default("virtualserver_maxclients"),
            channels_online: record.get_or_default("virtualserver_channelsonline"),
            host_banner_url: record.get_or_default("virtualserver_hostbanner_url"),
            host_banner_gfx_url: record.get_or_default("virtualserver_hostbanner_gfx_url"),
            needed_identity_security_level: record
                .get_or_default("virtualserver_needed_identity_security_level"),
            query_client_connections: record
                .get_or_default("virtualserver_query_client_connections"),
            client_connections: record.get_or_default("virtualserver_client_connections"),
        }
    }
}

/// Remove this query connection from the reported client count.
///
/// The count is decremented by one and floored at zero; non-numeric values
/// are returned unchanged.
pub fn adjust_clients_online(raw: &str) -> String {
    match raw.parse::<i64>() {
        Ok(n) => (n - 1).max(0).to_string(),
        Err(_) => raw.to_string(),
    }
}
