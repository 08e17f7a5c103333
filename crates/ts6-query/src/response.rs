//! Response decoding.
//!
//! A command answer is zero or more payload lines followed by exactly one
//! status line:
//!
//! ```text
//! cid=1 pid=0 channel_name=Lobby|cid=2 pid=1 channel_name=AFK
//! error id=0 msg=ok
//! ```
//!
//! The payload splits into records on `|`, records split into fields on
//! whitespace, and each field is `key=value` with an escaped value.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{QueryError, FLOOD_CONTROL_CODE};
use crate::escape::unescape;

/// Literal prefix of the terminal status line.
pub const STATUS_PREFIX: &str = "error id=";

/// Returns `true` if `line` is the terminal status line of a response.
#[inline]
pub fn is_status_line(line: &str) -> bool {
    line.starts_with(STATUS_PREFIX)
}

fn flood_wait_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"wait (\d+)ms").expect("flood wait pattern is valid"))
}

// =============================================================================
// Records
// =============================================================================

/// One `|`-separated record: an ordered list of fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Parse a single record. Values are unescaped; a bare token without `=`
    /// becomes a key with an empty value.
    pub fn parse(raw: &str) -> Self {
        let fields = raw
            .split_whitespace()
            .map(|token| match token.split_once('=') {
                Some((key, value)) => (key.to_string(), unescape(value)),
                None => (token.to_string(), String::new()),
            })
            .collect();
        Self { fields }
    }

    /// Value of the first field named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of `key`, or an empty string when absent.
    pub fn get_or_default(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Whether the record has a field named `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate fields in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Split a payload into records.
pub fn parse_records(payload: &str) -> Vec<Record> {
    payload
        .split('|')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(Record::parse)
        .collect()
}

// =============================================================================
// Status line
// =============================================================================

/// Parsed terminal status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    /// Numeric status; 0 is success.
    pub code: u32,
    /// Unescaped `msg` value.
    pub message: String,
    /// Unescaped `extra_msg` value, when present.
    pub extra_message: Option<String>,
}

impl Status {
    /// Parse an `error id=<n> msg=<text>` line.
    ///
    /// Returns `None` if the line is not a status line or the id is not numeric.
    pub fn parse(line: &str) -> Option<Self> {
        if !is_status_line(line) {
            return None;
        }
        let record = Record::parse(line);
        let code = record.get("id")?.parse().ok()?;
        Some(Self {
            code,
            message: record.get_or_default("msg"),
            extra_message: record.get("extra_msg").map(str::to_string),
        })
    }

    /// The canonical success status.
    pub fn ok() -> Self {
        Self {
            code: 0,
            message: "ok".to_string(),
            extra_message: None,
        }
    }

    /// Whether the command succeeded.
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    /// Whether the server throttled the command.
    pub fn is_flood(&self) -> bool {
        self.code == FLOOD_CONTROL_CODE
    }

    /// Message including the extra message, as shown to operators.
    pub fn full_message(&self) -> String {
        match &self.extra_message {
            Some(extra) if !extra.is_empty() => format!("{} ({})", self.message, extra),
            _ => self.message.clone(),
        }
    }

    /// Suggested wait from a flood status, parsed from `wait <n>ms`.
    pub fn flood_wait(&self) -> Option<u64> {
        let re = flood_wait_regex();
        std::iter::once(self.message.as_str())
            .chain(self.extra_message.as_deref())
            .find_map(|text| re.captures(text))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Convert a non-zero status into the matching error.
    pub fn into_result(self) -> Result<(), QueryError> {
        if self.is_ok() {
            Ok(())
        } else if self.is_flood() {
            Err(QueryError::Flood {
                code: self.code,
                wait_ms: self.flood_wait(),
                message: self.full_message(),
            })
        } else {
            Err(QueryError::Protocol {
                code: self.code,
                message: self.full_message(),
            })
        }
    }
}

// =============================================================================
// Response
// =============================================================================

/// A complete command answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// Payload lines preceding the status line.
    pub lines: Vec<String>,
    /// Terminal status.
    pub status: Status,
}

impl Response {
    /// Raw payload: every line before the status line, joined with `\n`.
    pub fn payload(&self) -> String {
        self.lines.join("\n")
    }

    /// Payload split into records.
    pub fn records(&self) -> Vec<Record> {
        parse_records(&self.payload())
    }

    /// First record, or an empty one when the payload is empty.
    pub fn first_record(&self) -> Record {
        self.records().into_iter().next().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ok() {
        let status = Status::parse("error id=0 msg=ok").unwrap();
        assert!(status.is_ok());
        assert_eq!(status, Status::ok());
        assert!(status.into_result().is_ok());
    }

    #[test]
    fn test_status_protocol_error() {
        let status = Status::parse("error id=520 msg=invalid\\sloginname\\sor\\spassword").unwrap();
        assert_eq!(status.code, 520);
        assert_eq!(status.message, "invalid loginname or password");

        let err = status.into_result().unwrap_err();
        assert_eq!(
            err,
            QueryError::Protocol {
                code: 520,
                message: "invalid loginname or password".to_string()
            }
        );
    }

    #[test]
    fn test_status_flood_wait() {
        let status = Status::parse(
            "error id=524 msg=client\\sis\\sflooding extra_msg=please\\swait\\s2500ms",
        )
        .unwrap();
        assert!(status.is_flood());
        assert_eq!(status.flood_wait(), Some(2500));

        match status.into_result() {
            Err(QueryError::Flood { code, wait_ms, .. }) => {
                assert_eq!(code, 524);
                assert_eq!(wait_ms, Some(2500));
            }
            other => panic!("expected flood error, got {:?}", other),
        }
    }

    #[test]
    fn test_status_flood_without_wait() {
        let status = Status::parse("error id=524 msg=client\\sis\\sflooding").unwrap();
        assert_eq!(status.flood_wait(), None);
    }

    #[test]
    fn test_status_rejects_non_status() {
        assert!(Status::parse("virtualserver_name=Test").is_none());
        assert!(Status::parse("error id=abc msg=ok").is_none());
    }

    #[test]
    fn test_parse_records() {
        let records = parse_records(
            "cid=1 pid=0 channel_name=Lobby|cid=2 pid=1 channel_name=AFK\\sRoom channel_flag_default",
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("channel_name"), Some("Lobby"));
        assert_eq!(records[1].get("channel_name"), Some("AFK Room"));
        assert_eq!(records[1].get("channel_flag_default"), Some(""));
        assert_eq!(records[1].get("missing"), None);
        assert_eq!(records[1].get_or_default("missing"), "");
    }

    #[test]
    fn test_record_keeps_wire_order() {
        let record = Record::parse("b=2 a=1 c=3");
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_parse_records_empty_payload() {
        assert!(parse_records("").is_empty());
        assert!(parse_records("   ").is_empty());
    }

    #[test]
    fn test_response_payload_excludes_status() {
        let response = Response {
            lines: vec!["version=3.13.7 build=1 platform=Linux".to_string()],
            status: Status::ok(),
        };
        assert_eq!(response.payload(), "version=3.13.7 build=1 platform=Linux");
        assert_eq!(response.first_record().get("platform"), Some("Linux"));
    }
}
