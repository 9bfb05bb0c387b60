//! The statistics-aggregation pass.
//!
//! `Analysis` is folded over the event stream one event at a time:
//! every event is classified by type and subtype and lands in the
//! per-category count/size buckets that the report renders. Per-file
//! analyses merge, so a directory of chunked exports aggregates the
//! same way a single file does.

use super::sized_count::SizedCount;
use crate::parser::schema::{
    EventType, IncrementalSource, NodeType, RecordingEvent, UnterminatedLine,
};
use crate::parser::ScanOutcome;
use crate::utils::config::CONSOLE_PLUGIN_PREFIX;
use log::warn;
use serde_json::Value;
use std::collections::HashMap;
use std::io;

/// Accumulated statistics over one or more recording files
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Event type label -> number of events
    pub event_type_counts: HashMap<String, u64>,

    /// Incremental source label -> count and cumulative `data` size
    pub incremental_source_counts: HashMap<String, SizedCount>,

    /// Node type label -> count and cumulative size of mutation additions
    pub addition_counts: HashMap<String, SizedCount>,

    /// Attribute name -> count and cumulative size of its new values
    pub attributes_individual: HashMap<String, SizedCount>,

    /// Sorted comma-joined attribute names -> count and size of the whole
    /// mutation entry (attribute mutations arrive batched; this shows
    /// which attributes change together)
    pub attributes_grouped: HashMap<String, SizedCount>,

    /// Plugin name -> count and cumulative `data` size
    pub plugin_counts: HashMap<String, SizedCount>,

    /// Console log level -> count and cumulative payload size
    pub console_log_counts: HashMap<String, SizedCount>,

    /// Serialized size of every mutation addition, in stream order
    pub addition_sizes: Vec<u64>,

    /// Mutation removals
    pub removals: SizedCount,

    /// Mutation text changes
    pub texts: SizedCount,

    /// Lines that failed to parse across all scanned files
    pub unterminated_lines: Vec<UnterminatedLine>,

    /// Earliest event timestamp seen (ms)
    pub first_timestamp: Option<i64>,

    /// Latest event timestamp seen (ms)
    pub last_timestamp: Option<i64>,

    /// Timestamps of full DOM snapshots, in stream order
    pub full_snapshot_timestamps: Vec<i64>,

    /// Full snapshots flagged `isAttachIframe`
    pub attach_iframe_count: u64,

    /// Events classified
    pub total_events: u64,

    /// Files scanned
    pub files_analyzed: u64,
}

impl Analysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one event into the aggregate buckets
    pub fn record_event(&mut self, event: &RecordingEvent) {
        self.total_events += 1;

        let event_type = event.event_type();
        *self
            .event_type_counts
            .entry(event_type.label().to_string())
            .or_insert(0) += 1;

        if let Some(timestamp) = event.timestamp {
            self.observe_timestamp(timestamp);
        }

        match event_type {
            EventType::FullSnapshot => self.record_full_snapshot(event),
            EventType::IncrementalSnapshot => self.record_incremental(event),
            EventType::Plugin => self.record_plugin(event),
            _ => {}
        }
    }

    /// Carry over per-file scan bookkeeping (unterminated lines)
    pub fn note_scan(&mut self, outcome: ScanOutcome) {
        self.unterminated_lines.extend(outcome.unterminated);
        self.files_analyzed += 1;
    }

    /// Fold another analysis into this one
    ///
    /// Counts and sizes add, timestamps take min/max, lists concatenate.
    pub fn merge(&mut self, other: Analysis) {
        for (key, count) in other.event_type_counts {
            *self.event_type_counts.entry(key).or_insert(0) += count;
        }
        merge_sized(&mut self.incremental_source_counts, other.incremental_source_counts);
        merge_sized(&mut self.addition_counts, other.addition_counts);
        merge_sized(&mut self.attributes_individual, other.attributes_individual);
        merge_sized(&mut self.attributes_grouped, other.attributes_grouped);
        merge_sized(&mut self.plugin_counts, other.plugin_counts);
        merge_sized(&mut self.console_log_counts, other.console_log_counts);

        self.addition_sizes.extend(other.addition_sizes);
        self.removals.merge(other.removals);
        self.texts.merge(other.texts);
        self.unterminated_lines.extend(other.unterminated_lines);
        self.full_snapshot_timestamps
            .extend(other.full_snapshot_timestamps);

        self.first_timestamp = min_option(self.first_timestamp, other.first_timestamp);
        self.last_timestamp = max_option(self.last_timestamp, other.last_timestamp);

        self.attach_iframe_count += other.attach_iframe_count;
        self.total_events += other.total_events;
        self.files_analyzed += other.files_analyzed;
    }

    /// Session duration in milliseconds, when any timestamps were seen
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => Some(last - first),
            _ => None,
        }
    }

    /// Union of every mutation bucket, for the ranked "top by size" view
    ///
    /// Matches the sections of the report: additions by node type, the
    /// `removal` and `text` buckets, and both attribute views. Colliding
    /// labels merge.
    pub fn mutation_overview(&self) -> HashMap<String, SizedCount> {
        let mut overview: HashMap<String, SizedCount> = HashMap::new();
        for (key, sized) in &self.addition_counts {
            overview.entry(key.clone()).or_default().merge(*sized);
        }
        overview.entry("removal".to_string()).or_default().merge(self.removals);
        overview.entry("text".to_string()).or_default().merge(self.texts);
        for (key, sized) in &self.attributes_grouped {
            overview.entry(key.clone()).or_default().merge(*sized);
        }
        for (key, sized) in &self.attributes_individual {
            overview.entry(key.clone()).or_default().merge(*sized);
        }
        overview
    }

    fn observe_timestamp(&mut self, timestamp: i64) {
        self.first_timestamp = min_option(self.first_timestamp, Some(timestamp));
        self.last_timestamp = max_option(self.last_timestamp, Some(timestamp));
    }

    fn record_full_snapshot(&mut self, event: &RecordingEvent) {
        if let Some(timestamp) = event.timestamp {
            self.full_snapshot_timestamps.push(timestamp);
        }
        let is_attach_iframe = event
            .data
            .as_ref()
            .and_then(|data| data.get("isAttachIframe"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if is_attach_iframe {
            self.attach_iframe_count += 1;
        }
    }

    fn record_incremental(&mut self, event: &RecordingEvent) {
        let Some(data) = event.data.as_ref() else {
            return;
        };

        let source_code = data.get("source").and_then(Value::as_i64).unwrap_or(-1);
        let label = IncrementalSource::label_for_code(source_code);
        *self.incremental_source_counts.entry(label).or_default() += serialized_size(data);

        if IncrementalSource::from_code(source_code) == Some(IncrementalSource::Mutation) {
            self.record_mutation(data);
        }
    }

    fn record_mutation(&mut self, data: &Value) {
        if let Some(removes) = data.get("removes").and_then(Value::as_array) {
            for remove in removes {
                self.removals += serialized_size(remove);
            }
        }

        if let Some(adds) = data.get("adds").and_then(Value::as_array) {
            for add in adds {
                let node_code = add
                    .pointer("/node/type")
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                let size = serialized_size(add);
                *self
                    .addition_counts
                    .entry(NodeType::label_for_code(node_code))
                    .or_default() += size;
                self.addition_sizes.push(size);
            }
        }

        if let Some(texts) = data.get("texts").and_then(Value::as_array) {
            for text in texts {
                self.texts += serialized_size(text);
            }
        }

        if let Some(entries) = data.get("attributes").and_then(Value::as_array) {
            for entry in entries {
                let Some(changed) = entry.get("attributes").and_then(Value::as_object) else {
                    continue;
                };

                let mut names: Vec<&str> = changed.keys().map(String::as_str).collect();
                names.sort_unstable();

                for name in &names {
                    if let Some(value) = changed.get(*name) {
                        *self
                            .attributes_individual
                            .entry((*name).to_string())
                            .or_default() += serialized_size(value);
                    }
                }

                *self
                    .attributes_grouped
                    .entry(names.join(","))
                    .or_default() += serialized_size(entry);
            }
        }
    }

    fn record_plugin(&mut self, event: &RecordingEvent) {
        let Some(data) = event.data.as_ref() else {
            return;
        };

        let name = data.get("plugin").and_then(Value::as_str).unwrap_or("unknown");
        *self.plugin_counts.entry(name.to_string()).or_default() += serialized_size(data);

        if name.starts_with(CONSOLE_PLUGIN_PREFIX) {
            if let Some(payload) = data.get("payload") {
                let level = payload
                    .get("level")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                *self
                    .console_log_counts
                    .entry(level.to_string())
                    .or_default() += serialized_size(payload);
            }
        }
    }
}

fn merge_sized(left: &mut HashMap<String, SizedCount>, right: HashMap<String, SizedCount>) {
    for (key, sized) in right {
        left.entry(key).or_default().merge(sized);
    }
}

fn min_option(left: Option<i64>, right: Option<i64>) -> Option<i64> {
    match (left, right) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_option(left: Option<i64>, right: Option<i64>) -> Option<i64> {
    match (left, right) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Byte length of a value's compact serialized form
///
/// **Public** - this is the "size" every bucket accumulates. Counts
/// through an [`io::Write`] sink, no intermediate string.
pub fn serialized_size(value: &Value) -> u64 {
    let mut counter = ByteCounter(0);
    if let Err(err) = serde_json::to_writer(&mut counter, value) {
        warn!("failed to size JSON fragment: {}", err);
    }
    counter.0
}

struct ByteCounter(u64);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(type_code: i64, data: Value, timestamp: i64) -> RecordingEvent {
        serde_json::from_value(json!({
            "type": type_code,
            "data": data,
            "timestamp": timestamp,
        }))
        .unwrap()
    }

    #[test]
    fn test_serialized_size_matches_compact_form() {
        let value = json!({"a": 1, "b": [1, 2, 3]});
        let compact = serde_json::to_string(&value).unwrap();
        assert_eq!(serialized_size(&value), compact.len() as u64);
    }

    #[test]
    fn test_event_type_counting() {
        let mut analysis = Analysis::new();
        analysis.record_event(&event(4, json!({}), 1000));
        analysis.record_event(&event(2, json!({}), 2000));
        analysis.record_event(&event(2, json!({}), 3000));
        analysis.record_event(&event(99, json!({}), 4000));

        assert_eq!(analysis.event_type_counts["Meta"], 1);
        assert_eq!(analysis.event_type_counts["FullSnapshot"], 2);
        assert_eq!(analysis.event_type_counts["Unknown"], 1);
        assert_eq!(analysis.total_events, 4);
        assert_eq!(analysis.first_timestamp, Some(1000));
        assert_eq!(analysis.last_timestamp, Some(4000));
        assert_eq!(analysis.full_snapshot_timestamps, vec![2000, 3000]);
    }

    #[test]
    fn test_incremental_source_sizing() {
        let mut analysis = Analysis::new();
        let data = json!({"source": 1, "positions": [{"x": 1, "y": 2}]});
        let size = serialized_size(&data);
        analysis.record_event(&event(3, data, 1000));

        let sized = analysis.incremental_source_counts["MouseMove"];
        assert_eq!(sized.count, 1);
        assert_eq!(sized.bytes, size);
    }

    #[test]
    fn test_unknown_incremental_source() {
        let mut analysis = Analysis::new();
        analysis.record_event(&event(3, json!({"source": 42}), 1000));
        assert!(analysis.incremental_source_counts.contains_key("Unknown(42)"));
    }

    #[test]
    fn test_mutation_breakdown() {
        let mut analysis = Analysis::new();
        let data = json!({
            "source": 0,
            "adds": [
                {"parentId": 1, "node": {"type": 1, "tagName": "div"}},
                {"parentId": 1, "node": {"type": 3, "textContent": "hi"}},
                {"parentId": 2, "node": {"type": 1, "tagName": "span"}}
            ],
            "removes": [{"parentId": 1, "id": 9}],
            "texts": [{"id": 3, "value": "updated"}],
            "attributes": [
                {"id": 5, "attributes": {"style": "color: red", "class": "big"}}
            ]
        });
        analysis.record_event(&event(3, data, 1000));

        assert_eq!(analysis.addition_counts["Element"].count, 2);
        assert_eq!(analysis.addition_counts["Text"].count, 1);
        assert_eq!(analysis.addition_sizes.len(), 3);
        assert_eq!(analysis.removals.count, 1);
        assert_eq!(analysis.texts.count, 1);
        assert_eq!(analysis.attributes_individual["style"].count, 1);
        assert_eq!(analysis.attributes_individual["class"].count, 1);
        assert_eq!(analysis.attributes_grouped["class,style"].count, 1);
    }

    #[test]
    fn test_attach_iframe_detection() {
        let mut analysis = Analysis::new();
        analysis.record_event(&event(2, json!({"isAttachIframe": true}), 1000));
        analysis.record_event(&event(2, json!({}), 2000));
        assert_eq!(analysis.attach_iframe_count, 1);
    }

    #[test]
    fn test_plugin_and_console_buckets() {
        let mut analysis = Analysis::new();
        let data = json!({
            "plugin": "rrweb/console@1",
            "payload": {"level": "warn", "payload": ["\"slow frame\""]}
        });
        analysis.record_event(&event(6, data, 1000));

        assert_eq!(analysis.plugin_counts["rrweb/console@1"].count, 1);
        assert_eq!(analysis.console_log_counts["warn"].count, 1);
    }

    #[test]
    fn test_merge() {
        let mut left = Analysis::new();
        left.record_event(&event(2, json!({}), 5000));
        left.record_event(&event(3, json!({"source": 3}), 6000));

        let mut right = Analysis::new();
        right.record_event(&event(3, json!({"source": 3}), 1000));
        right.record_event(&event(4, json!({}), 9000));

        left.merge(right);

        assert_eq!(left.total_events, 4);
        assert_eq!(left.first_timestamp, Some(1000));
        assert_eq!(left.last_timestamp, Some(9000));
        assert_eq!(left.event_type_counts["IncrementalSnapshot"], 2);
        assert_eq!(left.incremental_source_counts["Scroll"].count, 2);
    }

    #[test]
    fn test_merge_with_empty() {
        let mut left = Analysis::new();
        left.record_event(&event(4, json!({}), 1000));
        let before = left.clone();

        left.merge(Analysis::new());

        assert_eq!(left.total_events, before.total_events);
        assert_eq!(left.first_timestamp, before.first_timestamp);
    }

    #[test]
    fn test_mutation_overview_union() {
        let mut analysis = Analysis::new();
        let data = json!({
            "source": 0,
            "adds": [{"node": {"type": 1}}],
            "removes": [{"id": 1}],
            "texts": [{"id": 2, "value": "x"}],
            "attributes": [{"id": 3, "attributes": {"class": "a"}}]
        });
        analysis.record_event(&event(3, data, 1000));

        let overview = analysis.mutation_overview();
        assert!(overview.contains_key("Element"));
        assert!(overview.contains_key("removal"));
        assert!(overview.contains_key("text"));
        assert!(overview.contains_key("class"));
        assert_eq!(overview["removal"].count, 1);
    }

    #[test]
    fn test_malformed_subfields_are_ignored() {
        let mut analysis = Analysis::new();
        // adds is not an array, attributes entries lack the inner map
        let data = json!({
            "source": 0,
            "adds": "nope",
            "attributes": [{"id": 1}]
        });
        analysis.record_event(&event(3, data, 1000));

        assert!(analysis.addition_counts.is_empty());
        assert!(analysis.attributes_grouped.is_empty());
        assert_eq!(analysis.incremental_source_counts["Mutation"].count, 1);
    }
}
