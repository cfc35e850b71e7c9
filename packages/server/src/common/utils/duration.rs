/// Render a number of seconds as `"1h 2m 5s"`.
///
/// Zero hours and minutes are omitted; seconds are always shown. Negative
/// input renders as `"0s"`.
pub fn format_duration(seconds: i64) -> String {
    if seconds < 0 {
        return "0s".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", secs));

    parts.join(" ")
}

/// Convenience for `std::time::Duration`, rounded to the nearest second.
pub fn format_elapsed(elapsed: std::time::Duration) -> String {
    format_duration(elapsed.as_secs_f64().round() as i64)
}
