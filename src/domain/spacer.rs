//! Spacer tag parsing.
//!
//! TeamSpeak has no separator widget, so admins create channels whose names
//! carry a bracketed tag such as `[cspacer3]` or `[*spacer]`. The tag sets
//! alignment (`c`, `l`, `r`) or tiling (`*`); whatever text remains is what
//! the separator shows.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Fill patterns that always tile across the row.
const SOLID_PATTERNS: [&str; 5] = ["___", "---", "...", "-.-", "-.."];

fn spacer_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\[([clr]|\*)?spacer([^\]]*?)\]").expect("spacer pattern is valid")
    })
}

/// What a channel name renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// A regular channel.
    Normal,
    /// A spacer whose text is one of the fill patterns.
    SolidSpacer,
    /// A spacer showing text.
    AlignedSpacer,
    /// A spacer with nothing left after the tag.
    BlankSpacer,
}

/// Horizontal placement of spacer text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Result of [`parse_channel_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub kind: ChannelKind,
    pub alignment: Alignment,
    pub repeat: bool,
    /// Name with every spacer tag removed, trimmed.
    pub text: String,
}

/// Classify a raw channel name.
pub fn parse_channel_name(name: &str) -> ParsedName {
    let name = name.trim();
    let re = spacer_tag();

    let Some(caps) = re.captures(name) else {
        return ParsedName {
            kind: ChannelKind::Normal,
            alignment: Alignment::Left,
            repeat: false,
            text: name.to_string(),
        };
    };

    let prefix = caps
        .get(1)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    let alignment = match prefix.as_str() {
        "c" => Alignment::Center,
        "r" => Alignment::Right,
        _ => Alignment::Left,
    };
    let repeat = prefix == "*";
    let text = re.replace_all(name, "").trim().to_string();

    let (kind, repeat) = if text.is_empty() {
        (ChannelKind::BlankSpacer, repeat)
    } else if SOLID_PATTERNS.contains(&text.as_str()) {
        (ChannelKind::SolidSpacer, true)
    } else {
        (ChannelKind::AlignedSpacer, repeat)
    };

    ParsedName {
        kind,
        alignment,
        repeat,
        text,
    }
}
