//! Line-based codec for tokio.
//!
//! This module provides a codec that reads newline-terminated lines from a
//! ServerQuery stream and writes commands terminated by a single `\n`.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

/// Default maximum line length.
///
/// A whole `channellist` or `clientlist` answer arrives as one line, so this
/// is far above what interactive protocols use.
pub const DEFAULT_MAX_LINE_LEN: usize = 4 * 1024 * 1024;

/// Line-based codec for the query stream.
///
/// Raw query connections terminate lines with `\n\r`, leaving a stray `\r` at
/// the start of the following line. Decoded lines are therefore trimmed on
/// both ends.
#[derive(Debug)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
}

impl LineCodec {
    /// Create a codec with the default line limit.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a codec with a custom line limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    /// Configured line limit.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, CodecError> {
        // Look for newline starting from where we left off
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(CodecError::LineTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            // Channel names may carry legacy encodings; never fail on them.
            let data = String::from_utf8_lossy(&line);
            Ok(Some(data.trim().to_string()))
        } else {
            // No complete line yet - remember where we stopped
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(CodecError::LineTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = CodecError;

    fn encode(&mut self, command: String, dst: &mut BytesMut) -> Result<(), CodecError> {
        let command = command.trim_end_matches(['\r', '\n']);
        dst.reserve(command.len() + 1);
        dst.extend_from_slice(command.as_bytes());
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_complete_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("error id=0 msg=ok\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("error id=0 msg=ok".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_raw_query_framing() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("TS3\n\rWelcome to the TeamSpeak 3 ServerQuery interface\n\r");

        assert_eq!(codec.decode(&mut buf).unwrap(), Some("TS3".to_string()));
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("Welcome to the TeamSpeak 3 ServerQuery interface".to_string())
        );
        // Only the trailing '\r' is left; no line yet.
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("cid=1 pid=0");

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b" channel_name=Lobby\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("cid=1 pid=0 channel_name=Lobby".to_string())
        );
    }

    #[test]
    fn test_decode_too_long() {
        let mut codec = LineCodec::with_max_len(10);
        let mut buf = BytesMut::from("this is way too long\n");

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(CodecError::LineTooLong { .. })));
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"channel_name=Caf\xe9\n"[..]);

        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert!(line.starts_with("channel_name=Caf"));
    }

    #[test]
    fn test_encode() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec.encode("serverinfo".to_string(), &mut buf).unwrap();
        codec.encode("version\n".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"serverinfo\nversion\n");
    }
}
