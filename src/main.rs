//! ts6viewer - TeamSpeak channel viewer daemon.
//!
//! Keeps a ServerQuery session open and serves the channel tree over HTTP.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use ts6_viewer::config::{validate, Config};
use ts6_viewer::http::{self, AppState};
use ts6_viewer::security::RequestLimiter;
use ts6_viewer::viewer::{query_client, ViewSettings, ViewerService};

/// Requests per second allowed per client IP on the data endpoint.
const REQUESTS_PER_SECOND: u32 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {}",
            errors.len(),
            config_path
        ));
    }

    info!(
        host = %config.teamspeak.host,
        port = config.teamspeak.effective_port(),
        server_id = %config.teamspeak.server_id,
        transport = ?config.teamspeak.transport,
        "Starting ts6viewer"
    );

    let client = query_client(&config.teamspeak);
    let viewer = Arc::new(ViewerService::new(
        client.clone(),
        ViewSettings::from_config(&config),
    ));

    // Open the session ahead of the first request
    {
        let client = client.clone();
        let server_id = config.teamspeak.server_id.clone();
        tokio::spawn(async move {
            match client.select_server(&server_id).await {
                Ok(()) => info!(server_id = %server_id, "ServerQuery session ready"),
                Err(e) => warn!(error = %e, "Initial ServerQuery connect failed, will retry on demand"),
            }
        });
    }

    let limiter = Arc::new(RequestLimiter::new(REQUESTS_PER_SECOND));

    // Rate limiter pruning task (runs every 5 minutes)
    {
        let limiter = Arc::clone(&limiter);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup();
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(config.http.listen)
        .await
        .map_err(|e| {
            error!(addr = %config.http.listen, error = %e, "Failed to bind HTTP listener");
            e
        })?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received");
    };

    http::serve(listener, AppState { viewer, limiter }, shutdown).await?;

    client.close().await;
    info!("ts6viewer stopped");
    Ok(())
}
