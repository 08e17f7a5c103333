//! # ts6-query
//!
//! A persistent client for the TeamSpeak ServerQuery interface.
//!
//! ## Features
//!
//! - Line codec for the query stream (`\n` and `\n\r` framing)
//! - Field escaping/unescaping with the ServerQuery escape table
//! - Response decoding into ordered records and a terminal [`Status`]
//! - Typed views over `serverinfo`, `channellist` and `clientlist` records
//! - SSH and raw TCP transports behind a [`Connector`] seam
//! - [`QueryClient`]: login handshake, flood-control backoff, reconnection and a
//!   per-session keepalive
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use ts6_query::{ClientConfig, Credentials, Endpoint, QueryClient, SshConnector};
//!
//! let credentials = Credentials::new("serveradmin", "secret");
//! let connector = SshConnector::new(Endpoint::new("127.0.0.1", 10022), credentials.clone());
//! let client = QueryClient::new(
//!     ClientConfig::new(credentials).with_server_id("1"),
//!     Arc::new(connector),
//! );
//!
//! let info = client.server_info().await?;
//! println!("{} has {} clients online", info.name, info.clients_online);
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod escape;
pub mod line;
pub mod model;
pub mod response;
pub mod session;
pub mod transport;

pub use self::client::{backoff_for, ClientConfig, QueryClient, RetryPolicy};
pub use self::error::{CodecError, ErrorKind, QueryError, Result};
pub use self::escape::{escape, unescape};
pub use self::line::LineCodec;
pub use self::model::{
    adjust_clients_online, client_list_command, visible_clients, ChannelEntry, ClientEntry,
    ServerInfo, CHANNEL_LIST, KEEPALIVE, SERVER_INFO,
};
pub use self::response::{is_status_line, parse_records, Record, Response, Status};
pub use self::session::{Credentials, Session, Timeouts};
pub use self::transport::{
    Connector, Endpoint, QueryStream, RawConnector, SshConnector, Transport, TransportError,
};
