//! Display projection of the domain model.
//!
//! This is the JSON document served at `/ts6viewer/data`.

use serde::Serialize;

use crate::domain::{Alignment, Channel, ChannelKind, Client, Server};

/// Everything a viewer page needs for one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewerData {
    pub server: ServerView,
    pub channels: Vec<ChannelView>,
    pub theme: String,
    /// Seconds between client-side refreshes.
    pub refresh_interval: u64,
    /// RFC 3339 timestamp of the fetch.
    pub fetched_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerView {
    pub name: String,
    /// Count of listed clients.
    pub clients_online: String,
    pub max_clients: String,
    pub uptime_pretty: String,
    pub channels_online: String,
    pub host_banner_url: String,
    pub host_connection_link: String,
    pub client_connections: String,
}

impl ServerView {
    /// Build the server header. `visible_clients` replaces the reported count.
    pub fn new(server: &Server, visible_clients: usize, host_connection_link: &str) -> Self {
        Self {
            name: server.name.clone(),
            clients_online: visible_clients.to_string(),
            max_clients: server.max_clients.clone(),
            uptime_pretty: server.uptime_pretty.clone(),
            channels_online: server.channels_online.clone(),
            host_banner_url: server.host_banner_url.clone(),
            host_connection_link: host_connection_link.to_string(),
            client_connections: server.client_connections.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelView {
    pub id: String,
    pub name: String,
    pub topic: String,
    pub kind: ChannelKind,
    pub align: Alignment,
    pub repeat: bool,
    /// Sorted by nickname.
    pub clients: Vec<ClientView>,
    pub children: Vec<ChannelView>,
}

impl From<Channel> for ChannelView {
    fn from(channel: Channel) -> Self {
        let mut clients: Vec<ClientView> = channel.clients.into_iter().map(ClientView::from).collect();
        clients.sort_by(|a, b| a.nickname.cmp(&b.nickname));

        Self {
            id: channel.id,
            name: channel.name,
            topic: channel.topic,
            kind: channel.kind,
            align: channel.alignment,
            repeat: channel.repeat,
            clients,
            children: channel.children.into_iter().map(ChannelView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientView {
    pub nickname: String,
    pub platform: String,
    pub version: String,
    pub mic_muted: bool,
    pub output_muted: bool,
    pub is_talking: bool,
}

impl From<Client> for ClientView {
    fn from(client: Client) -> Self {
        Self {
            nickname: client.nickname,
            platform: client.platform,
            version: client.version,
            mic_muted: client.status.mic_muted,
            output_muted: client.status.output_muted,
            is_talking: client.status.is_talking,
        }
    }
}
