//! Error types for the ServerQuery client.
//!
//! Every command execution ends in exactly one outcome: a successful
//! [`Response`](crate::Response) or a [`QueryError`]. The error kind decides
//! how the client recovers:
//!
//! - [`ErrorKind::Connection`]: transport failure, recovered by reconnecting
//! - [`ErrorKind::Flood`]: status `524`, recovered by backing off
//! - [`ErrorKind::Protocol`]: any other non-zero status, returned as-is
//! - [`ErrorKind::Configuration`]: missing credentials, fatal

use thiserror::Error;

/// Convenience type alias for Results using [`QueryError`].
pub type Result<T, E = QueryError> = std::result::Result<T, E>;

/// Status code the server uses for flood control.
pub const FLOOD_CONTROL_CODE: u32 = 524;

/// Coarse classification of a [`QueryError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Semantic/command error reported by the server.
    Protocol,
    /// Transport-level failure (end of stream, reset, broken pipe, closed session).
    Connection,
    /// Server-side rate limiting.
    Flood,
    /// Local configuration is unusable.
    Configuration,
}

/// Failure of a ServerQuery operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum QueryError {
    /// The server answered with a non-zero, non-524 status.
    #[error("query error {code}: {message}")]
    Protocol {
        /// Status code from the `error id=` line.
        code: u32,
        /// Unescaped status message.
        message: String,
    },

    /// The server throttled the session.
    #[error("flood control ({code}): {message}")]
    Flood {
        /// Status code (always 524).
        code: u32,
        /// Unescaped status message, including any extra message.
        message: String,
        /// Suggested wait parsed from the message, if present.
        wait_ms: Option<u64>,
    },

    /// The transport failed or the session is no longer usable.
    #[error("connection error: {0}")]
    Connection(String),

    /// The client cannot (re)connect with the configuration it was given.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl QueryError {
    /// Build a connection error from anything displayable.
    pub fn connection(reason: impl std::fmt::Display) -> Self {
        Self::Connection(reason.to_string())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::Flood { .. } => ErrorKind::Flood,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Server status code, or 0 for errors that never reached the server.
    pub fn code(&self) -> u32 {
        match self {
            Self::Protocol { code, .. } | Self::Flood { code, .. } => *code,
            Self::Connection(_) | Self::Configuration(_) => 0,
        }
    }

    /// Human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Protocol { message, .. } | Self::Flood { message, .. } => message,
            Self::Connection(message) | Self::Configuration(message) => message,
        }
    }

    /// Suggested flood wait in milliseconds, if this is a flood error that carried one.
    pub fn flood_wait(&self) -> Option<u64> {
        match self {
            Self::Flood { wait_ms, .. } => *wait_ms,
            _ => None,
        }
    }

    /// Whether the recovery loop may reconnect and retry after this error.
    pub fn is_reconnectable(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }
}

impl From<std::io::Error> for QueryError {
    fn from(err: std::io::Error) -> Self {
        Self::Connection(err.to_string())
    }
}

/// Errors raised by the line codec.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A single line exceeded the configured limit.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Bytes buffered so far.
        actual: usize,
        /// Configured maximum.
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_code() {
        let err = QueryError::Protocol {
            code: 768,
            message: "invalid channelID".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(err.code(), 768);
        assert_eq!(err.message(), "invalid channelID");
        assert!(!err.is_reconnectable());

        let err = QueryError::connection("broken pipe");
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.code(), 0);
        assert!(err.is_reconnectable());
    }

    #[test]
    fn test_flood_wait() {
        let err = QueryError::Flood {
            code: FLOOD_CONTROL_CODE,
            message: "client is flooding".to_string(),
            wait_ms: Some(1500),
        };
        assert_eq!(err.kind(), ErrorKind::Flood);
        assert_eq!(err.flood_wait(), Some(1500));
        assert_eq!(QueryError::connection("eof").flood_wait(), None);
    }

    #[test]
    fn test_display() {
        let err = QueryError::Protocol {
            code: 520,
            message: "invalid loginname or password".to_string(),
        };
        assert_eq!(err.to_string(), "query error 520: invalid loginname or password");

        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        let err: QueryError = io_err.into();
        assert_eq!(err.to_string(), "connection error: connection reset");
    }
}
