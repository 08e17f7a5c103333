//! Domain reconstruction.
//!
//! Turns flat `channellist`/`clientlist`/`serverinfo` records into display
//! entities: channel names are classified as spacers or normal channels and
//! channels are linked into a forest rooted at parent id `"0"`.
//!
//! Everything here is pure and allocation-only.

mod spacer;
mod tree;
mod uptime;

pub use spacer::{parse_channel_name, Alignment, ChannelKind, ParsedName};
pub use tree::{build_channel_tree, TreeStats, ROOT_PARENT_ID};
pub use uptime::format_uptime;

use ts6_query::{ChannelEntry, ClientEntry, ServerInfo};

/// A channel with its parsed name, clients and sub-channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub parent_id: String,
    /// Display name with any spacer tag removed.
    pub name: String,
    pub topic: String,
    pub kind: ChannelKind,
    pub alignment: Alignment,
    /// Whether the spacer text tiles across the row.
    pub repeat: bool,
    /// Sub-channels in fetch order.
    pub children: Vec<Channel>,
    /// Clients in fetch order.
    pub clients: Vec<Client>,
}

impl Channel {
    /// Map a listing entry, parsing its name.
    pub fn from_entry(entry: &ChannelEntry) -> Self {
        let parsed = parse_channel_name(&entry.name);
        Self {
            id: entry.cid.clone(),
            parent_id: entry.pid.clone(),
            name: parsed.text,
            topic: entry.topic.clone(),
            kind: parsed.kind,
            alignment: parsed.alignment,
            repeat: parsed.repeat,
            children: Vec::new(),
            clients: Vec::new(),
        }
    }

    /// Whether this channel is a visual separator.
    pub fn is_spacer(&self) -> bool {
        self.kind != ChannelKind::Normal
    }

    /// Clients in this channel and all sub-channels.
    pub fn total_clients(&self) -> usize {
        self.clients.len()
            + self
                .children
                .iter()
                .map(Channel::total_clients)
                .sum::<usize>()
    }
}

/// Voice state of a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStatus {
    pub mic_muted: bool,
    pub output_muted: bool,
    pub is_talking: bool,
}

/// A connected client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: String,
    pub channel_id: String,
    pub nickname: String,
    pub platform: String,
    pub version: String,
    pub status: ClientStatus,
}

impl Client {
    /// Map a listing entry.
    ///
    /// The microphone counts as muted when it is muted or when the input
    /// device is disabled (`client_input_hardware=0`).
    pub fn from_entry(entry: &ClientEntry) -> Self {
        Self {
            id: entry.clid.clone(),
            channel_id: entry.cid.clone(),
            nickname: entry.nickname.clone(),
            platform: entry.platform.clone(),
            version: entry.version.clone(),
            status: ClientStatus {
                mic_muted: entry.input_muted == "1" || entry.input_hardware == "0",
                output_muted: entry.output_muted == "1",
                is_talking: entry.flag_talking == "1",
            },
        }
    }
}

/// Server counters ready for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Server {
    pub name: String,
    pub clients_online: String,
    pub max_clients: String,
    pub uptime_pretty: String,
    pub channels_online: String,
    pub host_banner_url: String,
    pub client_connections: String,
}

impl Server {
    /// Map a `serverinfo` snapshot. The client count is already adjusted.
    pub fn from_info(info: &ServerInfo) -> Self {
        Self {
            name: info.name.clone(),
            clients_online: info.clients_online.clone(),
            max_clients: info.max_clients.clone(),
            uptime_pretty: format_uptime(&info.uptime),
            channels_online: info.channels_online.clone(),
            host_banner_url: info.host_banner_url.clone(),
            client_connections: info.client_connections.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_from_entry_parses_name() {
        let entry = ChannelEntry {
            cid: "4".to_string(),
            pid: "0".to_string(),
            name: "[cspacer1]  Welcome ".to_string(),
            topic: "hello".to_string(),
            ..ChannelEntry::default()
        };
        let channel = Channel::from_entry(&entry);
        assert_eq!(channel.id, "4");
        assert_eq!(channel.parent_id, "0");
        assert_eq!(channel.name, "Welcome");
        assert_eq!(channel.kind, ChannelKind::AlignedSpacer);
        assert_eq!(channel.alignment, Alignment::Center);
        assert!(!channel.repeat);
        assert!(channel.is_spacer());
    }

    #[test]
    fn test_client_mic_status() {
        let mut entry = ClientEntry {
            clid: "5".to_string(),
            cid: "1".to_string(),
            nickname: "alice".to_string(),
            input_muted: "0".to_string(),
            input_hardware: "1".to_string(),
            output_muted: "1".to_string(),
            flag_talking: "1".to_string(),
            ..ClientEntry::default()
        };
        let client = Client::from_entry(&entry);
        assert!(!client.status.mic_muted);
        assert!(client.status.output_muted);
        assert!(client.status.is_talking);

        entry.input_hardware = "0".to_string();
        assert!(Client::from_entry(&entry).status.mic_muted);

        entry.input_hardware = "1".to_string();
        entry.input_muted = "1".to_string();
        assert!(Client::from_entry(&entry).status.mic_muted);
    }

    #[test]
    fn test_client_without_voice_fields() {
        let entry = ClientEntry {
            clid: "5".to_string(),
            nickname: "bob".to_string(),
            ..ClientEntry::default()
        };
        assert_eq!(Client::from_entry(&entry).status, ClientStatus::default());
    }

    #[test]
    fn test_server_from_info() {
        let info = ServerInfo {
            name: "Test".to_string(),
            uptime: "7384".to_string(),
            clients_online: "4".to_string(),
            ..ServerInfo::default()
        };
        let server = Server::from_info(&info);
        assert_eq!(server.uptime_pretty, "0D 02:03:04");
        assert_eq!(server.clients_online, "4");
    }
}
