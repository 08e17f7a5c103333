//! HTTP surface for the viewer.
//!
//! Serves the JSON document at `/ts6viewer/data`, plus liveness routes.

use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::error::ViewerError;
use crate::security::RequestLimiter;
use crate::view::ViewerData;
use crate::viewer::ViewerService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub viewer: Arc<ViewerService>,
    pub limiter: Arc<RequestLimiter>,
}

#[derive(Debug, Default, Deserialize)]
struct DataParams {
    #[serde(default)]
    force: Option<String>,
}

impl DataParams {
    fn force(&self) -> bool {
        matches!(self.force.as_deref(), Some("1" | "true"))
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ts6viewer/data", get(data_handler))
        .route("/ts6viewer/data/", get(data_handler))
        .with_state(state)
}

/// Serve `state` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server listening");
    }
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

async fn index_handler() -> &'static str {
    "TS6Viewer is running!"
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Handler for GET /ts6viewer/data.
///
/// Rate-limited callers get the last snapshot regardless of age.
async fn data_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<DataParams>,
) -> Result<Json<Arc<ViewerData>>, ViewerError> {
    let ip = client_ip(&headers, peer);

    if !state.limiter.check(ip) {
        debug!(ip = %ip, "rate limited, serving cached data");
        return state
            .viewer
            .cached()
            .map(Json)
            .ok_or(ViewerError::RateLimited);
    }

    let data = state.viewer.snapshot(params.force()).await?;
    Ok(Json(data))
}

/// First `X-Forwarded-For` entry when it parses, else the socket peer.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .unwrap_or_else(|| peer.ip())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.10:40000".parse().unwrap()
    }

    #[test]
    fn test_client_ip_from_peer() {
        assert_eq!(client_ip(&HeaderMap::new(), peer()), peer().ip());
    }

    #[test]
    fn test_client_ip_from_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(
            client_ip(&headers, peer()),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_client_ip_ignores_garbage_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown"));
        assert_eq!(client_ip(&headers, peer()), peer().ip());
    }

    #[test]
    fn test_force_param() {
        let parse = |v: Option<&str>| DataParams {
            force: v.map(str::to_string),
        }
        .force();
        assert!(parse(Some("1")));
        assert!(parse(Some("true")));
        assert!(!parse(Some("0")));
        assert!(!parse(None));
    }
}
