//! Line-framed command/response exchange.

use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio_util::codec::Framed;
use tracing::trace;

use crate::line::LineCodec;
use crate::response::{is_status_line, Response, Status};

use super::error::TransportError;
use super::BoxedStream;

/// A query stream framed into lines.
///
/// One command is written, then lines are read until the terminal
/// `error id=` line. The transport itself never retries or reconnects.
pub struct Transport {
    framed: Framed<BoxedStream, LineCodec>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("codec", self.framed.codec())
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Frame a connected stream with the default codec.
    pub fn new(stream: BoxedStream) -> Self {
        Self::with_codec(stream, LineCodec::new())
    }

    /// Frame a connected stream with a custom codec.
    pub fn with_codec(stream: BoxedStream, codec: LineCodec) -> Self {
        Self {
            framed: Framed::new(stream, codec),
        }
    }

    /// Write `command` followed by a newline and flush.
    pub async fn send(&mut self, command: &str) -> Result<(), TransportError> {
        trace!(command = %redact(command), "query >>");
        self.framed.send(command.to_string()).await?;
        Ok(())
    }

    /// Read the next non-empty line. End of stream is [`TransportError::Closed`].
    pub async fn read_line(&mut self) -> Result<String, TransportError> {
        loop {
            match self.framed.next().await {
                Some(Ok(line)) if line.is_empty() => continue,
                Some(Ok(line)) => {
                    trace!(line = %line, "query <<");
                    return Ok(line);
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Err(TransportError::Closed),
            }
        }
    }

    /// Read lines until the terminal status line.
    ///
    /// Any line starting with `error id=` ends the response. One that does not
    /// parse is [`TransportError::MalformedStatus`].
    pub async fn read_response(&mut self) -> Result<Response, TransportError> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            if is_status_line(&line) {
                return match Status::parse(&line) {
                    Some(status) => Ok(Response { lines, status }),
                    None => Err(TransportError::MalformedStatus(line)),
                };
            }
            lines.push(line);
        }
    }

    /// Send a command and read its full answer.
    pub async fn roundtrip(&mut self, command: &str) -> Result<Response, TransportError> {
        self.send(command).await?;
        self.read_response().await
    }

    /// Flush and shut down the write side. Errors are ignored; the stream is
    /// being discarded anyway.
    pub async fn shutdown(&mut self) {
        let _ = SinkExt::<String>::flush(&mut self.framed).await;
        let _ = self.framed.get_mut().shutdown().await;
    }
}

/// Hide credentials from trace output.
fn redact(command: &str) -> &str {
    if command.starts_with("login ") {
        "login <redacted>"
    } else {
        command
    }
}
