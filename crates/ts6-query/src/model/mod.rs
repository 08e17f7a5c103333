//! Typed views over ServerQuery records.
//!
//! Each type reads the keys it knows from a [`Record`](crate::Record) and
//! ignores the rest, so newer servers with extra fields still parse.

mod channel;
mod client;
mod server;

pub use channel::ChannelEntry;
pub use client::{client_list_command, visible_clients, ClientEntry};
pub use server::{adjust_clients_online, ServerInfo};

/// Channel listing with every flag the viewer needs.
pub const CHANNEL_LIST: &str = "channellist -topic -flags -limits -voice -icon -secondsempty";

/// Virtual server snapshot.
pub const SERVER_INFO: &str = "serverinfo";

/// No-op command used to keep the session alive.
pub const KEEPALIVE: &str = "version";
