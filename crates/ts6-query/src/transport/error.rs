//! Transport error types.

use thiserror::Error;

use crate::error::{CodecError, QueryError};

/// Errors that can occur while exchanging lines with the server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Framing or I/O failure.
    #[error("transport codec error: {0}")]
    Codec(#[from] CodecError),

    /// The peer closed the stream.
    #[error("stream closed by peer (eof)")]
    Closed,

    /// A line with the status prefix whose id is not a number.
    #[error("malformed status line: {0}")]
    MalformedStatus(String),
}

impl TransportError {
    /// Whether the stream can no longer be trusted.
    ///
    /// A malformed status line still ends its response, so the stream stays
    /// in step.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MalformedStatus(_))
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Codec(CodecError::Io(err))
    }
}

impl From<TransportError> for QueryError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::MalformedStatus(_) => QueryError::Protocol {
                code: 0,
                message: err.to_string(),
            },
            _ => QueryError::Connection(err.to_string()),
        }
    }
}
