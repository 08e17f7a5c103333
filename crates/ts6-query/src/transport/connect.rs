//! Stream connectors.
//!
//! A [`Connector`] knows how to reach the server and hands back a fresh byte
//! stream. It performs no ServerQuery I/O; the greeting, `login` and `use`
//! exchange belongs to [`Session`](crate::Session).

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use russh::client;
use russh_keys::key::PublicKey;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::QueryError;
use crate::session::Credentials;

use super::BoxedStream;

/// Status code for rejected credentials.
const INVALID_LOGIN_CODE: u32 = 520;

/// Upper bound on establishing the underlying connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens a new stream to the query interface.
///
/// The client calls this on first use and on every reconnect, so
/// implementations must be reusable.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a new stream.
    async fn connect(&self) -> Result<BoxedStream, QueryError>;

    /// Short description for logs (e.g. `ssh://host:10022`).
    fn describe(&self) -> String;
}

/// Host and port of the query interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

async fn dial(endpoint: &Endpoint) -> Result<TcpStream, QueryError> {
    let addr = (endpoint.host.as_str(), endpoint.port);
    match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(QueryError::connection(format!("dial {} failed: {}", endpoint, e))),
        Err(_) => Err(QueryError::connection(format!(
            "dial {} timed out after {:?}",
            endpoint, CONNECT_TIMEOUT
        ))),
    }
}

// =============================================================================
// Raw TCP
// =============================================================================

/// Plain-text ServerQuery over TCP.
#[derive(Clone, Debug)]
pub struct RawConnector {
    endpoint: Endpoint,
}

impl RawConnector {
    /// Create a connector for `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
        use socket2::{SockRef, TcpKeepalive};

        let sock = SockRef::from(stream);
        let keepalive = TcpKeepalive::new()
            .with_time(Duration::from_secs(120))
            .with_interval(Duration::from_secs(30));

        sock.set_tcp_keepalive(&keepalive)
    }
}

#[async_trait]
impl Connector for RawConnector {
    async fn connect(&self) -> Result<BoxedStream, QueryError> {
        let stream = dial(&self.endpoint).await?;
        if let Err(e) = Self::enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }
        let _ = stream.set_nodelay(true);
        debug!(endpoint = %self.endpoint, "raw query stream established");
        Ok(Box::new(stream))
    }

    fn describe(&self) -> String {
        format!("raw://{}", self.endpoint)
    }
}

// =============================================================================
// SSH
// =============================================================================

/// ServerQuery over SSH: password authentication, then an interactive shell
/// channel carries the query lines.
#[derive(Clone)]
pub struct SshConnector {
    endpoint: Endpoint,
    credentials: Credentials,
}

impl std::fmt::Debug for SshConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConnector")
            .field("endpoint", &self.endpoint)
            .field("user", &self.credentials.user)
            .finish_non_exhaustive()
    }
}

impl SshConnector {
    /// Create a connector authenticating as `credentials`.
    pub fn new(endpoint: Endpoint, credentials: Credentials) -> Self {
        Self {
            endpoint,
            credentials,
        }
    }

    async fn open_shell(&self) -> Result<SshStream, QueryError> {
        let tcp = dial(&self.endpoint).await?;
        let config = Arc::new(client::Config::default());

        let mut handle = client::connect_stream(config, tcp, AcceptAnyHostKey)
            .await
            .map_err(|e| QueryError::connection(format!("ssh handshake failed: {}", e)))?;

        let authenticated = handle
            .authenticate_password(
                self.credentials.user.clone(),
                self.credentials.password.clone(),
            )
            .await
            .map_err(|e| QueryError::connection(format!("ssh authentication error: {}", e)))?;
        if !authenticated {
            // Same code the query `login` command answers with.
            return Err(QueryError::Protocol {
                code: INVALID_LOGIN_CODE,
                message: format!("ssh authentication rejected for {}", self.credentials.user),
            });
        }

        #[allow(unused_mut)]
        let mut channel = handle
            .channel_open_session()
            .await
            .map_err(|e| QueryError::connection(format!("ssh session open failed: {}", e)))?;
        channel
            .request_shell(true)
            .await
            .map_err(|e| QueryError::connection(format!("ssh shell request failed: {}", e)))?;

        Ok(SshStream {
            stream: Box::pin(channel.into_stream()),
            _handle: Box::new(handle),
        })
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(&self) -> Result<BoxedStream, QueryError> {
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, self.open_shell())
            .await
            .map_err(|_| {
                QueryError::connection(format!(
                    "ssh connect to {} timed out after {:?}",
                    self.endpoint, CONNECT_TIMEOUT
                ))
            })??;
        debug!(endpoint = %self.endpoint, "ssh query shell established");
        Ok(Box::new(stream))
    }

    fn describe(&self) -> String {
        format!("ssh://{}@{}", self.credentials.user, self.endpoint)
    }
}

/// Accepts every server host key.
struct AcceptAnyHostKey;

#[async_trait]
impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

trait Duplex: AsyncRead + AsyncWrite + Send {}

impl<T: AsyncRead + AsyncWrite + Send> Duplex for T {}

/// Shell channel stream that keeps its SSH connection alive.
struct SshStream {
    stream: Pin<Box<dyn Duplex>>,
    _handle: Box<client::Handle<AcceptAnyHostKey>>,
}

impl AsyncRead for SshStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        self.get_mut().stream.as_mut().poll_read(cx, buf)
    }
}

impl AsyncWrite for SshStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.get_mut().stream.as_mut().poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.get_mut().stream.as_mut().poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.get_mut().stream.as_mut().poll_shutdown(cx)
    }
}
