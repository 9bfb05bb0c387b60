//! Timestamps command implementation.
//!
//! Converts the millisecond timestamps of every event into ISO-8601 and,
//! for buffered events carrying a `delay`, shows when the event will
//! actually land in replay. Useful for spotting recordings whose events
//! arrive far from when they were captured.

use crate::parser::{recording_paths, scan_recording};
use crate::utils::format::{format_delay_ms, format_timestamp_ms};
use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;

/// Arguments for the timestamps command
#[derive(Debug, Clone, Default)]
pub struct TimestampsArgs {
    /// Recording file or directory of recording files
    pub path: PathBuf,
}

/// One event's timestamps, resolved to human-readable times
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedSnapshot {
    #[serde(rename = "type")]
    pub type_code: i64,

    pub timestamp: i64,

    /// Capture time, ISO-8601 UTC
    pub time: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,

    /// Capture time shifted by the delay, ISO-8601 UTC
    #[serde(rename = "delayTime", skip_serializing_if = "Option::is_none")]
    pub delay_time: Option<String>,

    /// The delay spelled out, e.g. "2 minutes and 24 seconds"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timedelta: Option<String>,
}

/// Validate timestamps arguments
pub fn validate_args(args: &TimestampsArgs) -> Result<()> {
    if args.path.as_os_str().is_empty() {
        anyhow::bail!("recording path cannot be empty");
    }
    Ok(())
}

/// Execute the timestamps command
///
/// **Public** - prints a JSON array of processed snapshots to stdout
pub fn execute_timestamps(args: TimestampsArgs) -> Result<()> {
    info!("Converting timestamps for: {}", args.path.display());

    let paths = recording_paths(&args.path)
        .with_context(|| format!("failed to resolve {}", args.path.display()))?;

    let mut processed: Vec<ProcessedSnapshot> = Vec::new();
    for path in &paths {
        scan_recording(path, &mut |event| {
            let Some(timestamp) = event.timestamp else {
                warn!("skipping event without timestamp (type {})", event.type_code);
                return;
            };
            if let Some(snapshot) = process_snapshot(event.type_code, timestamp, event.delay) {
                processed.push(snapshot);
            }
        })
        .with_context(|| format!("failed to read {}", path.display()))?;
    }

    info!("Processed {} events", processed.len());

    let json = serde_json::to_string_pretty(&processed)
        .context("failed to serialize processed snapshots")?;
    println!("{}", json);

    Ok(())
}

/// Resolve one event's timestamps
///
/// **Private** - returns None when the timestamp is outside the
/// representable range.
fn process_snapshot(type_code: i64, timestamp: i64, delay: Option<f64>) -> Option<ProcessedSnapshot> {
    let time = match format_timestamp_ms(timestamp) {
        Some(time) => time,
        None => {
            warn!("skipping unrepresentable timestamp {}", timestamp);
            return None;
        }
    };

    let mut snapshot = ProcessedSnapshot {
        type_code,
        timestamp,
        time,
        delay,
        delay_time: None,
        timedelta: None,
    };

    if let Some(delay) = delay {
        let delayed_ms = (timestamp as f64 + delay).trunc() as i64;
        snapshot.delay_time = format_timestamp_ms(delayed_ms);
        snapshot.timedelta = Some(format_delay_ms(delay));
    }

    Some(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_args_empty_path() {
        assert!(validate_args(&TimestampsArgs::default()).is_err());
    }

    #[test]
    fn test_process_snapshot_without_delay() {
        let snapshot = process_snapshot(4, 1709810585828, None).unwrap();

        assert_eq!(snapshot.type_code, 4);
        assert_eq!(snapshot.time, "2024-03-07T11:23:05Z");
        assert!(snapshot.delay_time.is_none());
        assert!(snapshot.timedelta.is_none());
    }

    #[test]
    fn test_process_snapshot_with_delay() {
        let snapshot = process_snapshot(4, 1709810585828, Some(-144426.67749023438)).unwrap();

        assert_eq!(snapshot.delay, Some(-144426.67749023438));
        // 1709810585828 - 144426.677 ms = 1709810441401 ms
        assert_eq!(snapshot.delay_time.as_deref(), Some("2024-03-07T11:20:41Z"));
        assert_eq!(snapshot.timedelta.as_deref(), Some("2 minutes and 24 seconds"));
    }

    #[test]
    fn test_serialization_skips_absent_delay() {
        let snapshot = process_snapshot(4, 1709810585828, None).unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();

        assert!(json.contains("\"type\":4"));
        assert!(!json.contains("delay"));
    }
}
