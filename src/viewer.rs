//! Viewer data service.
//!
//! Fetches channels, clients and server info through the persistent query
//! client, projects them into a [`ViewerData`] document and caches the
//! result for a configurable time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use ts6_query::{
    ChannelEntry, ClientConfig, ClientEntry, Connector, Credentials, Endpoint, QueryClient,
    RawConnector, ServerInfo, SshConnector, Timeouts,
};

use crate::config::{Config, QueryTransport, TeamspeakConfig};
use crate::domain::{build_channel_tree, Channel, Client, Server};
use crate::error::ViewerError;
use crate::view::{ChannelView, ServerView, ViewerData};

/// Page-level settings copied into every snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSettings {
    pub theme: String,
    pub refresh_interval: u64,
    pub host_connection_link: String,
    /// Request voice fields in `clientlist`.
    pub voice_status: bool,
    pub cache_ttl: Duration,
}

impl ViewSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            theme: config.http.theme.clone(),
            refresh_interval: config.http.refresh_hint(),
            host_connection_link: config.http.host_connection_link.clone(),
            voice_status: config.teamspeak.enable_voice_status,
            cache_ttl: config.http.cache_ttl(),
        }
    }
}

/// Build the query client described by `config`.
///
/// Nothing is dialed until the first command.
pub fn query_client(config: &TeamspeakConfig) -> QueryClient {
    let credentials = Credentials::new(config.user.clone(), config.password.clone());
    let endpoint = Endpoint::new(config.host.clone(), config.effective_port());
    let connector: Arc<dyn Connector> = match config.transport {
        QueryTransport::Ssh => Arc::new(SshConnector::new(endpoint, credentials.clone())),
        QueryTransport::Raw => Arc::new(RawConnector::new(endpoint)),
    };

    let client_config = ClientConfig::new(credentials)
        .with_server_id(config.server_id.clone())
        .with_keepalive(config.keepalive_interval())
        .with_timeouts(Timeouts {
            command: config.command_timeout(),
            ..Timeouts::default()
        });

    QueryClient::new(client_config, connector)
}

/// Assemble the served document from one round of listings.
pub fn build_view(
    settings: &ViewSettings,
    channels: &[ChannelEntry],
    clients: &[ClientEntry],
    info: &ServerInfo,
    fetched_at: DateTime<Utc>,
) -> ViewerData {
    let channels: Vec<Channel> = channels.iter().map(Channel::from_entry).collect();
    let clients: Vec<Client> = clients.iter().map(Client::from_entry).collect();
    let visible = clients.len();
    let (tree, _) = build_channel_tree(channels, clients);

    ViewerData {
        server: ServerView::new(
            &Server::from_info(info),
            visible,
            &settings.host_connection_link,
        ),
        channels: tree.into_iter().map(ChannelView::from).collect(),
        theme: settings.theme.clone(),
        refresh_interval: settings.refresh_interval,
        fetched_at: fetched_at.to_rfc3339(),
    }
}

#[derive(Clone)]
struct Snapshot {
    data: Arc<ViewerData>,
    taken: Instant,
}

/// Cached access to the viewer document.
pub struct ViewerService {
    client: QueryClient,
    settings: ViewSettings,
    /// Serializes fetches so concurrent misses cause one round of commands.
    fetch_lock: Mutex<()>,
    latest: RwLock<Option<Snapshot>>,
}

impl ViewerService {
    pub fn new(client: QueryClient, settings: ViewSettings) -> Self {
        Self {
            client,
            settings,
            fetch_lock: Mutex::new(()),
            latest: RwLock::new(None),
        }
    }

    /// The underlying query client.
    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    /// Current document: cached while fresh unless `force` is set.
    pub async fn snapshot(&self, force: bool) -> Result<Arc<ViewerData>, ViewerError> {
        let _guard = self.fetch_lock.lock().await;

        if !force {
            if let Some(data) = self.fresh() {
                debug!("serving cached viewer data");
                return Ok(data);
            }
        }

        info!(force, "fetching viewer data");
        let data = match self.fetch().await {
            Ok(data) => Arc::new(data),
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "viewer data fetch failed");
                return Err(e);
            }
        };

        *self.latest.write() = Some(Snapshot {
            data: Arc::clone(&data),
            taken: Instant::now(),
        });
        debug!(channels = data.channels.len(), "viewer data updated and cached");
        Ok(data)
    }

    /// Last fetched document regardless of age.
    pub fn cached(&self) -> Option<Arc<ViewerData>> {
        self.latest.read().as_ref().map(|s| Arc::clone(&s.data))
    }

    fn fresh(&self) -> Option<Arc<ViewerData>> {
        self.latest
            .read()
            .as_ref()
            .filter(|s| s.taken.elapsed() < self.settings.cache_ttl)
            .map(|s| Arc::clone(&s.data))
    }

    async fn fetch(&self) -> Result<ViewerData, ViewerError> {
        let channels = self.client.channel_list().await?;
        let clients = self.client.client_list(self.settings.voice_status).await?;
        let info = self.client.server_info().await?;

        Ok(build_view(
            &self.settings,
            &channels,
            &clients,
            &info,
            Utc::now(),
        ))
    }
}
