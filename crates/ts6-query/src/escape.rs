//! ServerQuery field escaping.
//!
//! Values on the wire never contain raw spaces or pipes; those separate
//! fields and records. The server escapes them with a backslash table.

/// Escape pairs: (wire sequence, decoded char).
const ESCAPES: &[(char, char)] = &[
    ('s', ' '),
    ('p', '|'),
    ('/', '/'),
    (':', ':'),
    ('.', '.'),
    ('(', '('),
    (')', ')'),
    ('?', '?'),
    ('!', '!'),
    ('-', '-'),
    ('_', '_'),
    ('\\', '\\'),
];

fn decode(code: char) -> Option<char> {
    ESCAPES
        .iter()
        .find(|(wire, _)| *wire == code)
        .map(|(_, plain)| *plain)
}

/// Decode a field value.
///
/// Unknown sequences are kept verbatim so a newer server cannot make a
/// value disappear.
pub fn unescape(s: &str) -> String {
    if !s.contains('\\') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(code) => match decode(code) {
                Some(plain) => out.push(plain),
                None => {
                    out.push('\\');
                    out.push(code);
                }
            },
            None => out.push('\\'),
        }
    }
    out
}

/// Encode a command argument.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ' ' => out.push_str("\\s"),
            '|' => out.push_str("\\p"),
            '/' => out.push_str("\\/"),
            _ => out.push(ch),
        }
    }
    out
}
