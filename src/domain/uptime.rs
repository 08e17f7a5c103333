//! Uptime formatting.

/// Render seconds as `<days>D HH:MM:SS`.
///
/// Negative or non-numeric input is returned unchanged.
pub fn format_uptime(seconds: &str) -> String {
    let Ok(total) = seconds.parse::<i64>() else {
        return seconds.to_string();
    };
    if total < 0 {
        return seconds.to_string();
    }

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = total % 60;
    format!("{}D {:02}:{:02}:{:02}", days, hours, minutes, secs)
}
