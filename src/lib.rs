//! ts6-viewer - live channel and client viewer for TeamSpeak servers.
//!
//! Holds one persistent ServerQuery session, rebuilds the channel tree from
//! its listings and serves the result as JSON.

pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod security;
pub mod view;
pub mod viewer;
