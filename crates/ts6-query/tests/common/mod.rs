//! Integration test common infrastructure.
//!
//! An in-memory ServerQuery server behind a [`Connector`], with scripted
//! replies per connection.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use ts6_query::transport::BoxedStream;
use ts6_query::{ClientConfig, Connector, Credentials, QueryClient, QueryError, RetryPolicy};

pub const GREETING: &str = "TS3\n\rWelcome to the TeamSpeak 3 ServerQuery interface, type \"help\" for a list of commands.\n\r";
pub const OK: &str = "error id=0 msg=ok\n\r";

/// What the fake server does with one command line.
pub enum Reply {
    /// Write these bytes back.
    Send(String),
    /// Drop the connection.
    Hangup,
    /// Read the command and never answer.
    Silence,
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Send(OK.to_string())
    }

    pub fn payload(payload: &str) -> Self {
        Reply::Send(format!("{}\n\r{}", payload, OK))
    }

    pub fn error(code: u32, escaped_msg: &str) -> Self {
        Reply::Send(format!("error id={} msg={}\n\r", code, escaped_msg))
    }

    pub fn flood() -> Self {
        Reply::Send(
            "error id=524 msg=client\\sis\\sflooding extra_msg=please\\swait\\s700ms\n\r"
                .to_string(),
        )
    }
}

type Handler = dyn Fn(usize, &str) -> Option<Reply> + Send + Sync;

/// Scripted query server.
///
/// The handler sees `(connection index, command line)`. Returning `None`
/// falls back to answering `ok`.
pub struct FakeServer {
    handler: Arc<Handler>,
    connects: AtomicUsize,
    refusals: AtomicUsize,
    commands: Arc<Mutex<Vec<(usize, String)>>>,
}

impl FakeServer {
    pub fn new(handler: impl Fn(usize, &str) -> Option<Reply> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Arc::new(handler),
            connects: AtomicUsize::new(0),
            refusals: AtomicUsize::new(0),
            commands: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// A server that answers `ok` to everything.
    pub fn healthy() -> Arc<Self> {
        Self::new(|_, _| None)
    }

    /// Refuse the next `n` connection attempts.
    pub fn refuse_next(&self, n: usize) {
        self.refusals.store(n, Ordering::SeqCst);
    }

    /// Streams handed out so far (refused attempts excluded).
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Every command line received, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().iter().map(|(_, c)| c.clone()).collect()
    }

    /// Command lines received on connection `index`.
    pub fn commands_on(&self, index: usize) -> Vec<String> {
        self.commands
            .lock()
            .iter()
            .filter(|(i, _)| *i == index)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// How many times `command` was received.
    pub fn count(&self, command: &str) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|(_, c)| c == command)
            .count()
    }
}

#[async_trait]
impl Connector for FakeServer {
    async fn connect(&self) -> Result<BoxedStream, QueryError> {
        let refused = self
            .refusals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(QueryError::connection("connection refused"));
        }

        let index = self.connects.fetch_add(1, Ordering::SeqCst);
        let (client, server) = tokio::io::duplex(64 * 1024);
        let handler = Arc::clone(&self.handler);
        let commands = Arc::clone(&self.commands);

        tokio::spawn(async move {
            let (read, mut write) = tokio::io::split(server);
            let mut lines = BufReader::new(read).lines();
            if write.write_all(GREETING.as_bytes()).await.is_err() {
                return;
            }
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim().to_string();
                commands.lock().push((index, line.clone()));
                match handler(index, &line).unwrap_or_else(Reply::ok) {
                    Reply::Send(bytes) => {
                        if write.write_all(bytes.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                    Reply::Hangup => return,
                    Reply::Silence => {}
                }
            }
        });

        Ok(Box::new(client))
    }

    fn describe(&self) -> String {
        "fake://query".to_string()
    }
}

/// Recovery limits small enough for tests to run in milliseconds.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_flood_retries: 3,
        max_reconnects: 1,
        max_backoff: Duration::from_millis(20),
        jitter: Duration::ZERO,
        default_flood_wait: Duration::from_millis(5),
        reconnect_delay: Duration::from_millis(1),
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new(Credentials::new("serveradmin", "secret"))
        .with_server_id("1")
        .with_retry(fast_policy())
        .with_keepalive(None)
}

pub fn test_client(server: &Arc<FakeServer>, config: ClientConfig) -> QueryClient {
    QueryClient::new(config, Arc::clone(server) as Arc<dyn Connector>)
}
