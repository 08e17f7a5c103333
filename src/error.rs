//! Unified error handling for the viewer.
//!
//! Query failures surface here and are mapped to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use ts6_query::{ErrorKind, QueryError};

/// Errors returned by the viewer service and its HTTP handlers.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("teamspeak query failed: {0}")]
    Query(#[from] QueryError),

    #[error("rate limited and no cached data available")]
    RateLimited,
}

impl ViewerError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Query(e) => match e.kind() {
                ErrorKind::Protocol => "query_protocol",
                ErrorKind::Connection => "query_connection",
                ErrorKind::Flood => "query_flood",
                ErrorKind::Configuration => "query_configuration",
            },
            Self::RateLimited => "rate_limited",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Query(_) => StatusCode::BAD_GATEWAY,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ViewerError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
