//! Integration test common infrastructure.
//!
//! A canned ServerQuery server behind a [`Connector`] and helpers for
//! building the viewer router around it.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::connect_info::MockConnectInfo;
use axum::Router;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use ts6_query::transport::BoxedStream;
use ts6_query::{ClientConfig, Connector, Credentials, QueryClient, QueryError};
use ts6_viewer::http::{router, AppState};
use ts6_viewer::security::RequestLimiter;
use ts6_viewer::viewer::{ViewSettings, ViewerService};

const GREETING: &str = "TS3\n\rWelcome to the TeamSpeak 3 ServerQuery interface.\n\r";
const OK: &str = "error id=0 msg=ok\n\r";

pub const CHANNELS: &str = "cid=1 pid=0 channel_order=0 channel_name=Lobby channel_topic=Hang\\sout total_clients=2|\
cid=2 pid=0 channel_order=1 channel_name=[cspacer0]--- total_clients=0|\
cid=3 pid=1 channel_order=0 channel_name=Games\\sRoom total_clients=1|\
cid=4 pid=99 channel_order=0 channel_name=Lost total_clients=0";

pub const CLIENTS: &str = "clid=1 cid=1 client_database_id=1 client_nickname=serveradmin client_type=1|\
clid=5 cid=1 client_database_id=12 client_nickname=zoe client_type=0 client_platform=Linux client_input_muted=1 client_input_hardware=1|\
clid=6 cid=1 client_database_id=13 client_nickname=adam client_type=0 client_platform=Windows client_input_hardware=0|\
clid=7 cid=3 client_database_id=14 client_nickname=mia client_type=0 client_flag_talking=1 client_input_hardware=1";

pub const SERVER_INFO: &str = "virtualserver_id=1 virtualserver_name=Test\\sServer virtualserver_uptime=3725 \
virtualserver_clientsonline=4 virtualserver_maxclients=32 virtualserver_channelsonline=4";

/// ServerQuery server with fixed listings.
#[derive(Default)]
pub struct CannedServer {
    commands: Arc<Mutex<Vec<String>>>,
    deny_channels: Arc<AtomicBool>,
}

impl CannedServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `channellist` with a permission error from now on.
    pub fn deny_channel_list(&self) {
        self.deny_channels.store(true, Ordering::SeqCst);
    }

    /// How many received commands start with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

fn answer(command: &str, deny_channels: bool) -> String {
    let verb = command.split_whitespace().next().unwrap_or_default();
    match verb {
        "channellist" if deny_channels => {
            "error id=2568 msg=insufficient\\sclient\\spermissions failed_permid=4\n\r".to_string()
        }
        "channellist" => format!("{}\n\r{}", CHANNELS, OK),
        "clientlist" => format!("{}\n\r{}", CLIENTS, OK),
        "serverinfo" => format!("{}\n\r{}", SERVER_INFO, OK),
        _ => OK.to_string(),
    }
}

#[async_trait]
impl Connector for CannedServer {
    async fn connect(&self) -> Result<BoxedStream, QueryError> {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let commands = Arc::clone(&self.commands);
        let deny_channels = Arc::clone(&self.deny_channels);

        tokio::spawn(async move {
            let (read, mut write) = tokio::io::split(server);
            let mut lines = BufReader::new(read).lines();
            if write.write_all(GREETING.as_bytes()).await.is_err() {
                return;
            }
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim().to_string();
                let reply = answer(&line, deny_channels.load(Ordering::SeqCst));
                commands.lock().push(line);
                if write.write_all(reply.as_bytes()).await.is_err() {
                    return;
                }
            }
        });

        Ok(Box::new(client))
    }

    fn describe(&self) -> String {
        "canned://query".to_string()
    }
}

pub fn settings(cache_ttl: Duration) -> ViewSettings {
    ViewSettings {
        theme: "dark".to_string(),
        refresh_interval: 60,
        host_connection_link: "ts3server://ts.example.org".to_string(),
        voice_status: true,
        cache_ttl,
    }
}

pub fn viewer(server: &Arc<CannedServer>, cache_ttl: Duration) -> Arc<ViewerService> {
    let config = ClientConfig::new(Credentials::new("serveradmin", "secret"))
        .with_server_id("1")
        .with_keepalive(None);
    let client = QueryClient::new(config, Arc::clone(server) as Arc<dyn Connector>);
    Arc::new(ViewerService::new(client, settings(cache_ttl)))
}

/// Router with a mocked peer address of 192.0.2.1.
pub fn app(viewer: Arc<ViewerService>) -> Router {
    let peer: SocketAddr = ([192, 0, 2, 1], 50000).into();
    router(AppState {
        viewer,
        limiter: Arc::new(RequestLimiter::new(1)),
    })
    .layer(MockConnectInfo(peer))
}
