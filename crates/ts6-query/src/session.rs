//! One authenticated ServerQuery session.
//!
//! A [`Session`] walks a fresh stream through the handshake
//!
//! ```text
//! Connecting -> greeting -> login -> use <sid> -> Ready
//! ```
//!
//! and then runs single command round trips. It never retries; recovery is
//! the job of [`QueryClient`](crate::QueryClient). Once a transport error is
//! seen the session is closed for good and must be replaced.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::QueryError;
use crate::escape::escape;
use crate::response::Response;
use crate::transport::{Connector, Transport, TransportError};

/// Substrings that identify the server greeting.
const GREETING_MARKERS: &[&str] = &["Welcome", "TS3"];

/// Query login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Query login name.
    pub user: String,
    /// Query password.
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Both user and password are set.
    pub fn is_complete(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Deadlines applied by a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// Bound on the `use` exchange (default 5 s).
    pub select: Duration,
    /// Bound on every command round trip; `None` waits indefinitely.
    pub command: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            select: Duration::from_secs(5),
            command: None,
        }
    }
}

/// An authenticated, line-oriented command session.
#[derive(Debug)]
pub struct Session {
    id: u64,
    transport: Transport,
    closed: bool,
    cancel: CancellationToken,
    timeouts: Timeouts,
}

impl Session {
    /// Connect, wait for the greeting, log in and optionally select a server.
    ///
    /// `id` identifies this session in logs and lets the client tell a
    /// replaced session from the current one.
    pub async fn open(
        connector: &dyn Connector,
        credentials: &Credentials,
        server_id: Option<&str>,
        id: u64,
        timeouts: Timeouts,
    ) -> Result<Self, QueryError> {
        if !credentials.is_complete() {
            return Err(QueryError::Configuration(
                "query user and password are required".to_string(),
            ));
        }

        info!(session = id, target = %connector.describe(), "opening query session");
        let stream = connector.connect().await?;

        let mut session = Self {
            id,
            transport: Transport::new(stream),
            closed: false,
            cancel: CancellationToken::new(),
            timeouts,
        };

        session.await_greeting().await?;
        session.login(credentials).await?;
        if let Some(server_id) = server_id {
            session.select_server(server_id).await?;
        }

        info!(session = id, "query session ready");
        Ok(session)
    }

    async fn await_greeting(&mut self) -> Result<(), QueryError> {
        debug!(session = self.id, "waiting for greeting");
        loop {
            let line = self.transport.read_line().await.map_err(|e| self.fail(e))?;
            if GREETING_MARKERS.iter().any(|marker| line.contains(marker)) {
                return Ok(());
            }
        }
    }

    async fn login(&mut self, credentials: &Credentials) -> Result<(), QueryError> {
        debug!(session = self.id, user = %credentials.user, "sending login");
        let command = format!(
            "login {} {}",
            escape(&credentials.user),
            escape(&credentials.password)
        );
        let response = self
            .transport
            .roundtrip(&command)
            .await
            .map_err(|e| self.fail(e))?;

        // Bad credentials are never transient; flood answers here are fatal too.
        if !response.status.is_ok() {
            return Err(QueryError::Protocol {
                code: response.status.code,
                message: format!("login failed: {}", response.status.full_message()),
            });
        }
        debug!(session = self.id, "login accepted");
        Ok(())
    }

    /// Select a virtual server with `use`.
    ///
    /// The exchange is bounded by [`Timeouts::select`]; running out of time
    /// leaves the stream out of sync, so the session is closed and a
    /// connection error returned.
    pub async fn select_server(&mut self, server_id: &str) -> Result<(), QueryError> {
        self.ensure_open()?;
        info!(session = self.id, server_id = %server_id, "selecting virtual server");

        let command = format!("use {}", escape(server_id));
        let response = match tokio::time::timeout(
            self.timeouts.select,
            self.transport.roundtrip(&command),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(self.fail(e)),
            Err(_) => {
                self.closed = true;
                return Err(QueryError::connection(format!(
                    "timed out after {:?} waiting for use response",
                    self.timeouts.select
                )));
            }
        };

        if !response.status.is_ok() {
            return Err(QueryError::Protocol {
                code: response.status.code,
                message: format!("use {} failed: {}", server_id, response.status.full_message()),
            });
        }
        debug!(session = self.id, server_id = %server_id, "virtual server selected");
        Ok(())
    }

    /// Run one command and read its complete answer.
    ///
    /// Status 524 maps to [`QueryError::Flood`], other non-zero statuses to
    /// [`QueryError::Protocol`]. Transport failures and cancellation close
    /// the session and map to [`QueryError::Connection`].
    pub async fn execute(&mut self, command: &str) -> Result<Response, QueryError> {
        self.ensure_open()?;

        let cancel = self.cancel.clone();
        let deadline = self.timeouts.command;
        let exchange = async {
            match deadline {
                Some(limit) => tokio::time::timeout(limit, self.transport.roundtrip(command))
                    .await
                    .map_err(|_| Interrupted::TimedOut(limit))?
                    .map_err(Interrupted::Transport),
                None => self
                    .transport
                    .roundtrip(command)
                    .await
                    .map_err(Interrupted::Transport),
            }
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(Interrupted::Cancelled),
            result = exchange => result,
        };

        let response = match outcome {
            Ok(response) => response,
            Err(interrupted) => {
                if interrupted.is_fatal() {
                    self.closed = true;
                }
                return Err(interrupted.into_error(self.id));
            }
        };

        response.status.clone().into_result()?;
        Ok(response)
    }

    /// Best-effort `quit` followed by stream shutdown.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(1), self.transport.send("quit")).await;
        self.transport.shutdown().await;
        debug!(session = self.id, "query session closed");
    }

    /// Session identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the session can no longer run commands.
    pub fn is_closed(&self) -> bool {
        self.closed || self.cancel.is_cancelled()
    }

    /// Token that interrupts in-flight reads when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn ensure_open(&self) -> Result<(), QueryError> {
        if self.is_closed() {
            Err(QueryError::connection(format!("session {} is closed", self.id)))
        } else {
            Ok(())
        }
    }

    fn fail(&mut self, err: TransportError) -> QueryError {
        if err.is_fatal() {
            self.closed = true;
        }
        err.into()
    }
}

/// Why a round trip did not produce a response.
enum Interrupted {
    Transport(TransportError),
    TimedOut(Duration),
    Cancelled,
}

impl Interrupted {
    fn is_fatal(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_fatal(),
            Self::TimedOut(_) | Self::Cancelled => true,
        }
    }

    fn into_error(self, session: u64) -> QueryError {
        match self {
            Self::Transport(e) => e.into(),
            Self::TimedOut(limit) => {
                QueryError::connection(format!("no response within {:?}", limit))
            }
            Self::Cancelled => {
                QueryError::connection(format!("session {} was replaced", session))
            }
        }
    }
}
