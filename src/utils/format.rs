//! Human-readable formatting for byte sizes, timestamps, and durations.

use chrono::{DateTime, Utc};

const BINARY_UNITS: &[&str] = &["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"];

/// Format a byte count with binary units and one decimal place
///
/// **Public** - used everywhere sizes are rendered
///
/// # Example
/// ```
/// use replay_lens::utils::format::human_bytes;
/// assert_eq!(human_bytes(3200), "3.1KiB");
/// ```
pub fn human_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in BINARY_UNITS {
        if value < 1024.0 {
            return format!("{:.1}{}B", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1}YiB", value)
}

/// Format a millisecond Unix timestamp as ISO-8601 UTC with second precision
///
/// **Public** - used by the report and the timestamps command
///
/// Returns None when the timestamp is outside the representable range.
pub fn format_timestamp_ms(timestamp_ms: i64) -> Option<String> {
    let dt: DateTime<Utc> = DateTime::from_timestamp_millis(timestamp_ms)?;
    Some(format!("{}Z", dt.format("%Y-%m-%dT%H:%M:%S")))
}

/// Format a millisecond duration as H:MM:SS
pub fn format_duration_ms(duration_ms: i64) -> String {
    let total_seconds = duration_ms.unsigned_abs() / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let sign = if duration_ms < 0 { "-" } else { "" };
    format!("{}{}:{:02}:{:02}", sign, hours, minutes, seconds)
}

/// Format a millisecond delay as "<m> minutes and <s> seconds"
///
/// Used by the timestamps command for the human delay breakdown.
pub fn format_delay_ms(delay_ms: f64) -> String {
    let total_seconds = (delay_ms / 1000.0).abs();
    let minutes = (total_seconds / 60.0).trunc() as i64;
    let seconds = (total_seconds % 60.0).trunc() as i64;
    format!("{} minutes and {} seconds", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_bytes_small() {
        assert_eq!(human_bytes(0), "0.0B");
        assert_eq!(human_bytes(512), "512.0B");
    }

    #[test]
    fn test_human_bytes_units() {
        assert_eq!(human_bytes(1024), "1.0KiB");
        assert_eq!(human_bytes(1536), "1.5KiB");
        assert_eq!(human_bytes(5 * 1024 * 1024), "5.0MiB");
        assert_eq!(human_bytes(3 * 1024 * 1024 * 1024), "3.0GiB");
    }

    #[test]
    fn test_format_timestamp_ms() {
        // 2024-03-07T11:23:05.828Z, sub-second part truncated
        assert_eq!(
            format_timestamp_ms(1709810585828).unwrap(),
            "2024-03-07T11:23:05Z"
        );
    }

    #[test]
    fn test_format_duration_ms() {
        assert_eq!(format_duration_ms(0), "0:00:00");
        assert_eq!(format_duration_ms(42 * 60 * 1000 + 10_000), "0:42:10");
        assert_eq!(format_duration_ms(3 * 3600 * 1000 + 5000), "3:00:05");
        assert_eq!(format_duration_ms(-5000), "-0:00:05");
    }

    #[test]
    fn test_format_delay_ms() {
        assert_eq!(format_delay_ms(-144426.677), "2 minutes and 24 seconds");
        assert_eq!(format_delay_ms(1000.0), "0 minutes and 1 seconds");
    }
}
