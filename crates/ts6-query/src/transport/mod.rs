//! ServerQuery transport layer for async I/O.
//!
//! This module provides the byte-stream seam the rest of the crate is built on.
//!
//! # Features
//!
//! - [`QueryStream`]: any `AsyncRead + AsyncWrite` stream a session can run on
//! - [`Connector`]: opens a fresh stream; the client calls it again on every reconnect
//!   - [`SshConnector`]: ServerQuery over SSH (default port 10022)
//!   - [`RawConnector`]: plain-text ServerQuery over TCP (default port 10011)
//! - [`Transport`]: line-framed command/response exchange over a [`QueryStream`]

mod connect;
mod error;
mod framed;

pub use connect::{Connector, Endpoint, RawConnector, SshConnector, CONNECT_TIMEOUT};
pub use error::TransportError;
pub use framed::Transport;

use tokio::io::{AsyncRead, AsyncWrite};

/// A bidirectional byte stream carrying one query session.
pub trait QueryStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> QueryStream for T {}

/// Owned, type-erased query stream.
pub type BoxedStream = Box<dyn QueryStream>;
