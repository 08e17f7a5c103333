//! Persistent query client with automatic recovery.
//!
//! [`QueryClient`] owns at most one live [`Session`] and replaces it when it
//! breaks. Every command runs through the same recovery loop:
//!
//! - flood status (524): back off `min(wait * 2^n, cap)` plus jitter and
//!   retry; after too many flood retries, reconnect
//! - connection failure: pause, reconnect and retry
//! - any other status: returned to the caller untouched
//!
//! Reconnects are serialized. A caller that lost the race for the reconnect
//! lock reuses the session the winner opened instead of opening another.

mod backoff;
mod keepalive;

pub use backoff::{backoff_for, RetryPolicy};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{ErrorKind, QueryError};
use crate::model::{
    client_list_command, visible_clients, ChannelEntry, ClientEntry, ServerInfo, CHANNEL_LIST,
    SERVER_INFO,
};
use crate::response::Response;
use crate::session::{Credentials, Session, Timeouts};
use crate::transport::Connector;

/// Default interval between keepalive commands.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Client settings.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Query login used for every session.
    pub credentials: Credentials,
    /// Virtual server selected after login, if any.
    pub server_id: Option<String>,
    /// Recovery limits.
    pub retry: RetryPolicy,
    /// Keepalive period; `None` disables the keepalive.
    pub keepalive_interval: Option<Duration>,
    /// Handshake and command deadlines.
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Settings with default recovery, keepalive and timeouts.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            server_id: None,
            retry: RetryPolicy::default(),
            keepalive_interval: Some(DEFAULT_KEEPALIVE_INTERVAL),
            timeouts: Timeouts::default(),
        }
    }

    /// Select `server_id` on every new session.
    pub fn with_server_id(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }

    /// Override the recovery limits.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the keepalive period.
    pub fn with_keepalive(mut self, interval: Option<Duration>) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Override handshake and command deadlines.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

/// A live session plus the token that retires it.
struct SessionSlot {
    id: u64,
    token: CancellationToken,
    session: Mutex<Session>,
}

impl SessionSlot {
    fn is_retired(&self) -> bool {
        self.token.is_cancelled()
    }

    fn retire(&self) {
        self.token.cancel();
    }
}

struct Shared {
    connector: Arc<dyn Connector>,
    config: ClientConfig,
    /// Last successfully selected virtual server.
    server_id: RwLock<Option<String>>,
    current: RwLock<Option<Arc<SessionSlot>>>,
    reconnect_lock: Mutex<()>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Return the current session, opening one if there is none or if the
    /// current one is `stale` or retired.
    fn ensure_session(
        self: &Arc<Self>,
        stale: Option<u64>,
    ) -> BoxFuture<'_, Result<Arc<SessionSlot>, QueryError>> {
        async move {
            let _guard = self.reconnect_lock.lock().await;
            if self.is_closed() {
                return Err(QueryError::connection("client is closed"));
            }

            let current = self.current.read().clone();
            if let Some(current) = current {
                if Some(current.id) != stale && !current.is_retired() {
                    return Ok(current);
                }
            }

            let previous = self.current.write().take();
            if let Some(previous) = previous {
                info!(session = previous.id, "retiring query session");
                previous.retire();
            }

            let slot = self.open_slot().await?;
            *self.current.write() = Some(Arc::clone(&slot));
            self.spawn_keepalive(&slot);
            Ok(slot)
        }
        .boxed()
    }

    async fn open_slot(&self) -> Result<Arc<SessionSlot>, QueryError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let server_id = self.server_id.read().clone();
        let session = Session::open(
            self.connector.as_ref(),
            &self.config.credentials,
            server_id.as_deref(),
            id,
            self.config.timeouts,
        )
        .await?;

        Ok(Arc::new(SessionSlot {
            id,
            token: session.cancel_token(),
            session: Mutex::new(session),
        }))
    }

    fn spawn_keepalive(self: &Arc<Self>, slot: &Arc<SessionSlot>) {
        let Some(every) = self.config.keepalive_interval else {
            return;
        };
        tokio::spawn(keepalive::run(
            Arc::downgrade(self),
            Arc::downgrade(slot),
            slot.token.clone(),
            slot.id,
            every,
        ));
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(slot) = self.current.get_mut().take() {
            slot.retire();
        }
    }
}

/// Cloneable handle to one persistent ServerQuery connection.
///
/// Connects lazily on first use. Clones share the session.
#[derive(Clone)]
pub struct QueryClient {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("target", &self.shared.connector.describe())
            .field("session", &self.session_id())
            .field("closed", &self.shared.is_closed())
            .finish()
    }
}

impl QueryClient {
    /// Create a client. No I/O happens until the first command.
    pub fn new(config: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        let server_id = config.server_id.clone();
        Self {
            shared: Arc::new(Shared {
                connector,
                config,
                server_id: RwLock::new(server_id),
                current: RwLock::new(None),
                reconnect_lock: Mutex::new(()),
                next_id: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Select a virtual server and remember it for future sessions.
    ///
    /// Runs once without retries; a `use` that does not answer within the
    /// select timeout retires the session.
    pub async fn select_server(&self, server_id: &str) -> Result<(), QueryError> {
        let slot = self.shared.ensure_session(None).await?;
        let result = {
            let mut session = slot.session.lock().await;
            session.select_server(server_id).await
        };
        match result {
            Ok(()) => {
                *self.shared.server_id.write() = Some(server_id.to_string());
                Ok(())
            }
            Err(e) => {
                if e.is_reconnectable() {
                    slot.retire();
                }
                Err(e)
            }
        }
    }

    /// Run `command` and return its payload.
    pub async fn execute(&self, command: &str) -> Result<String, QueryError> {
        self.execute_response(command)
            .await
            .map(|response| response.payload())
    }

    /// Run `command` through the recovery loop and return the full answer.
    pub async fn execute_response(&self, command: &str) -> Result<Response, QueryError> {
        let policy = self.shared.config.retry;
        let mut flood_retries = 0u32;
        let mut reconnects = 0u32;
        let mut stale = None;

        loop {
            let (session_id, result) = self.attempt(command, stale.take()).await;
            let err = match result {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            match err.kind() {
                ErrorKind::Protocol | ErrorKind::Configuration => return Err(err),
                ErrorKind::Flood => {
                    let delay = policy.flood_delay(err.flood_wait(), flood_retries);
                    flood_retries += 1;
                    warn!(
                        command = %command,
                        retry = flood_retries,
                        delay_ms = delay.as_millis() as u64,
                        "flood control, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    if flood_retries < policy.max_flood_retries {
                        continue;
                    }
                    // Only a flood-forced reconnect starts the count over
                    flood_retries = 0;
                }
                ErrorKind::Connection => {}
            }

            if self.shared.is_closed() {
                return Err(err);
            }
            if reconnects >= policy.max_reconnects {
                error!(
                    command = %command,
                    reconnects = reconnects,
                    error = %err,
                    "giving up on command"
                );
                return Err(err);
            }

            reconnects += 1;
            warn!(
                command = %command,
                attempt = reconnects,
                error = %err,
                "reconnecting query session"
            );
            tokio::time::sleep(policy.reconnect_delay).await;
            stale = session_id;
        }
    }

    /// One try on the current session. Returns the session used, if any.
    async fn attempt(
        &self,
        command: &str,
        stale: Option<u64>,
    ) -> (Option<u64>, Result<Response, QueryError>) {
        let slot = match self.shared.ensure_session(stale).await {
            Ok(slot) => slot,
            Err(e) => return (None, Err(e)),
        };

        let result = {
            let mut session = slot.session.lock().await;
            session.execute(command).await
        };
        if let Err(e) = &result {
            if e.is_reconnectable() {
                debug!(session = slot.id, error = %e, "session failed");
                slot.retire();
            }
        }
        (Some(slot.id), result)
    }

    /// `serverinfo` as a typed snapshot.
    pub async fn server_info(&self) -> Result<ServerInfo, QueryError> {
        let response = self.execute_response(SERVER_INFO).await?;
        Ok(ServerInfo::from_record(&response.first_record()))
    }

    /// Every channel, in server order.
    pub async fn channel_list(&self) -> Result<Vec<ChannelEntry>, QueryError> {
        let response = self.execute_response(CHANNEL_LIST).await?;
        Ok(response
            .records()
            .iter()
            .map(ChannelEntry::from_record)
            .collect())
    }

    /// Connected clients without query clients or server admins.
    pub async fn client_list(&self, voice: bool) -> Result<Vec<ClientEntry>, QueryError> {
        let response = self.execute_response(&client_list_command(voice)).await?;
        let clients = response
            .records()
            .iter()
            .map(ClientEntry::from_record)
            .collect();
        Ok(visible_clients(clients))
    }

    /// Identifier of the live session, if connected.
    pub fn session_id(&self) -> Option<u64> {
        self.shared
            .current
            .read()
            .as_ref()
            .filter(|slot| !slot.is_retired())
            .map(|slot| slot.id)
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Stop the keepalive, send `quit` and drop the session. Later commands
    /// fail with a connection error.
    pub async fn close(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _guard = self.shared.reconnect_lock.lock().await;
        let slot = self.shared.current.write().take();
        let Some(slot) = slot else {
            return;
        };

        info!(session = slot.id, "closing query session");
        match tokio::time::timeout(Duration::from_secs(1), slot.session.lock()).await {
            Ok(mut session) => session.close().await,
            Err(_) => debug!(session = slot.id, "session busy, dropping without quit"),
        }
        slot.retire();
    }
}
