//! `clientlist` record.

use crate::response::Record;

/// `client_type` of query connections.
const QUERY_CLIENT_TYPE: &str = "1";

/// Database id of the built-in ServerAdmin account.
const SERVER_ADMIN_DATABASE_ID: &str = "1";

/// Build the client listing command; `-voice` adds mute/talk state.
pub fn client_list_command(voice: bool) -> String {
    let mut command = String::from("clientlist -uid -away -groups -times -info -country -icon");
    if voice {
        command.push_str(" -voice");
    }
    command
}

/// One connected client as listed by the server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[allow(missing_docs)] // field names mirror the wire keys
pub struct ClientEntry {
    /// Connection id.
    pub clid: String,
    /// Channel the client is in.
    pub cid: String,
    pub database_id: String,
    pub unique_identifier: String,
    pub nickname: String,
    /// `"0"` for voice clients, `"1"` for query clients.
    pub client_type: String,
    pub away: String,
    pub away_message: String,
    pub input_muted: String,
    pub output_muted: String,
    pub output_only_muted: String,
    pub input_hardware: String,
    pub output_hardware: String,
    pub is_talker: String,
    pub flag_talking: String,
    pub platform: String,
    pub version: String,
    pub country: String,
    pub idle_time: String,
}

impl ClientEntry {
    /// Read the known client keys.
    pub fn from_record(record: &Record) -> Self {
        Self {
            clid: record.get_or_default("clid"),
            cid: record.get_or_default("cid"),
            database_id: record.get_or_default("client_database_id"),
            unique_identifier: record.get_or_default("client_unique_identifier"),
            nickname: record.get_or_default("client_nickname"),
            client_type: record.get_or_default("client_type"),
            away: record.get_or_default("client_away"),
            away_message: record.get_or_default("client_away_message"),
            input_muted: record.get_or_default("client_input_muted"),
            output_muted: record.get_or_default("client_output_muted"),
            output_only_muted: record.get_or_default("client_outputonly_muted"),
            input_hardware: record.get_or_default("client_input_hardware"),
            output_hardware: record.get_or_default("client_output_hardware"),
            is_talker: record.get_or_default("client_is_talker"),
            flag_talking: record.get_or_default("client_flag_talking"),
            platform: record.get_or_default("client_platform"),
            version: record.get_or_default("client_version"),
            country: record.get_or_default("client_country"),
            idle_time: record.get_or_default("client_idle_time"),
        }
    }

    /// Query connections (including our own) are not people.
    pub fn is_query_client(&self) -> bool {
        self.client_type == QUERY_CLIENT_TYPE
    }

    /// The built-in ServerAdmin account.
    pub fn is_server_admin(&self) -> bool {
        self.database_id == SERVER_ADMIN_DATABASE_ID
    }

    /// Whether this client may appear in listings.
    pub fn is_visible(&self) -> bool {
        !self.is_query_client() && !self.is_server_admin()
    }
}

/// Drop query clients and the ServerAdmin account, keeping listing order.
pub fn visible_clients(clients: Vec<ClientEntry>) -> Vec<ClientEntry> {
    clients.into_iter().filter(ClientEntry::is_visible).collect()
}
