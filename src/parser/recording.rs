//! Streaming reader for exported session recordings.
//!
//! Recordings can be gigabytes; the event array is therefore consumed one
//! event at a time through a `DeserializeSeed` visitor instead of being
//! materialized as a `Vec`. Three on-disk shapes are handled:
//!
//! - export wrapper: `{"data": {"snapshots": [...]}, ...}`
//! - top-level array: `[...]`
//! - JSON lines: one event or one `{"data": [...]}` batch per line

use super::schema::{RecordingEvent, UnterminatedLine};
use crate::utils::config::{CONTAINER_FIELD_NAMES, RECORDING_EXTENSIONS, UNTERMINATED_TAIL_CHARS};
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Detected on-disk shape of a recording file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingFormat {
    /// Single JSON document with the event array nested under a wrapper key
    ExportWrapper,
    /// Single JSON document that is the event array itself
    EventArray,
    /// One JSON document per line
    JsonLines,
}

/// Result of scanning one recording file
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Events delivered to the callback
    pub events: u64,

    /// Lines that failed to parse (JSON-lines input only)
    pub unterminated: Vec<UnterminatedLine>,
}

/// How many bytes of the file head are inspected for format detection
const DETECT_WINDOW: usize = 64 * 1024;

/// How deep wrapper objects are searched for the event array
const MAX_CONTAINER_DEPTH: u8 = 4;

/// Scan a recording file, feeding every event to `on_event`
///
/// **Public** - main entry point for reading a single file
///
/// # Errors
/// * `ParseError::Io` - file cannot be opened or read
/// * `ParseError::Json` - the document is not valid JSON
/// * `ParseError::InvalidFormat` - valid JSON with no event array inside
pub fn scan_recording<F>(path: &Path, on_event: &mut F) -> Result<ScanOutcome, ParseError>
where
    F: FnMut(RecordingEvent),
{
    let format = detect_format(path)?;
    debug!("{}: detected format {:?}", path.display(), format);

    match format {
        RecordingFormat::ExportWrapper | RecordingFormat::EventArray => {
            scan_document(path, on_event)
        }
        RecordingFormat::JsonLines => scan_lines(path, on_event),
    }
}

/// List the recording files behind a path
///
/// **Public** - a file yields itself; a directory yields its recording
/// files (by extension) in name order.
pub fn recording_paths(path: &Path) -> Result<Vec<PathBuf>, ParseError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if path.is_dir() {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && has_recording_extension(p))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(ParseError::NotARecording(format!(
                "directory contains no recording files: {}",
                path.display()
            )));
        }
        return Ok(paths);
    }

    Err(ParseError::NotARecording(format!(
        "path does not exist: {}",
        path.display()
    )))
}

fn has_recording_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| RECORDING_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Detect the on-disk shape of a recording file
///
/// **Private** - heuristic over the file head. A `.jsonl` extension wins
/// outright; otherwise a complete JSON document on the first line (within
/// the detection window) means JSON lines, and anything else is a single
/// document.
fn detect_format(path: &Path) -> Result<RecordingFormat, ParseError> {
    if path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jsonl"))
        .unwrap_or(false)
    {
        return Ok(RecordingFormat::JsonLines);
    }

    let mut file = File::open(path)?;
    let mut window = vec![0u8; DETECT_WINDOW];
    let mut filled = 0;
    loop {
        let n = file.read(&mut window[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
        if filled == window.len() {
            break;
        }
    }
    let head = &window[..filled];

    let first = head
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .copied()
        .ok_or_else(|| {
            ParseError::InvalidFormat(format!("file is empty: {}", path.display()))
        })?;

    match first {
        b'[' => Ok(RecordingFormat::EventArray),
        b'{' => {
            // A newline-terminated first line that parses standalone means
            // the file is line-delimited.
            if let Some(newline) = head.iter().position(|&b| b == b'\n') {
                let line = trim_ascii(&head[..newline]);
                if serde_json::from_slice::<IgnoredAny>(line).is_ok() {
                    return Ok(RecordingFormat::JsonLines);
                }
            }
            Ok(RecordingFormat::ExportWrapper)
        }
        other => Err(ParseError::InvalidFormat(format!(
            "unexpected leading byte 0x{:02x} in {}",
            other,
            path.display()
        ))),
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|i| i + 1)
        .unwrap_or(start);
    &bytes[start..end]
}

/// Scan a single-document recording (wrapper or top-level array)
///
/// **Private** - drives the streaming seed over a buffered reader
fn scan_document<F>(path: &Path, on_event: &mut F) -> Result<ScanOutcome, ParseError>
where
    F: FnMut(RecordingEvent),
{
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut deserializer = serde_json::Deserializer::from_reader(reader);

    let mut events = 0u64;
    let found = EventStream {
        on_event,
        events: &mut events,
        depth: 0,
    }
    .deserialize(&mut deserializer)?;

    if !found {
        return Err(ParseError::InvalidFormat(format!(
            "no event array found in {}",
            path.display()
        )));
    }

    debug!("{}: streamed {} events", path.display(), events);
    Ok(ScanOutcome {
        events,
        unterminated: Vec::new(),
    })
}

/// Streaming seed over the snapshot array
///
/// Visits the document without buffering it: sequences are consumed one
/// element at a time, wrapper objects are searched for a container key
/// (`snapshots`, `data`, `events`) and every other value is ignored.
/// Yields `true` once an event array has been consumed.
struct EventStream<'a, F> {
    on_event: &'a mut F,
    events: &'a mut u64,
    depth: u8,
}

impl<'de, 'a, F> DeserializeSeed<'de> for EventStream<'a, F>
where
    F: FnMut(RecordingEvent),
{
    type Value = bool;

    fn deserialize<D>(self, deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, 'a, F> Visitor<'de> for EventStream<'a, F>
where
    F: FnMut(RecordingEvent),
{
    type Value = bool;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an event array or a wrapper object containing one")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<bool, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut index = 0usize;
        while let Some(value) = seq.next_element::<serde_json::Value>()? {
            match serde_json::from_value::<RecordingEvent>(value) {
                Ok(event) => {
                    *self.events += 1;
                    (self.on_event)(event);
                }
                Err(err) => {
                    // Malformed individual events are skipped, not fatal
                    warn!("skipping malformed event at index {}: {}", index, err);
                }
            }
            index += 1;
        }
        Ok(true)
    }

    fn visit_map<A>(self, mut map: A) -> Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        let EventStream {
            on_event,
            events,
            depth,
        } = self;

        let mut found = false;
        while let Some(key) = map.next_key::<String>()? {
            if !found
                && depth < MAX_CONTAINER_DEPTH
                && CONTAINER_FIELD_NAMES.contains(&key.as_str())
            {
                found = map.next_value_seed(EventStream {
                    on_event: &mut *on_event,
                    events: &mut *events,
                    depth: depth + 1,
                })?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(found)
    }

    // Scalar values under a container key are not event arrays; skip them
    // instead of failing the whole document.

    fn visit_bool<E: serde::de::Error>(self, _: bool) -> Result<bool, E> {
        Ok(false)
    }

    fn visit_i64<E: serde::de::Error>(self, _: i64) -> Result<bool, E> {
        Ok(false)
    }

    fn visit_u64<E: serde::de::Error>(self, _: u64) -> Result<bool, E> {
        Ok(false)
    }

    fn visit_f64<E: serde::de::Error>(self, _: f64) -> Result<bool, E> {
        Ok(false)
    }

    fn visit_str<E: serde::de::Error>(self, _: &str) -> Result<bool, E> {
        Ok(false)
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<bool, E> {
        Ok(false)
    }
}

/// Scan a JSON-lines recording
///
/// **Private** - each line is a standalone document: either one event or
/// a batch object carrying an event array. Lines that fail to parse
/// (chunked exports are routinely cut mid-line) are recorded and skipped.
fn scan_lines<F>(path: &Path, on_event: &mut F) -> Result<ScanOutcome, ParseError>
where
    F: FnMut(RecordingEvent),
{
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut outcome = ScanOutcome::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(value) => {
                for event_value in line_events(value, 0) {
                    match serde_json::from_value::<RecordingEvent>(event_value) {
                        Ok(event) => {
                            outcome.events += 1;
                            on_event(event);
                        }
                        Err(err) => {
                            warn!(
                                "{}:{}: skipping malformed event: {}",
                                path.display(),
                                index,
                                err
                            );
                        }
                    }
                }
            }
            Err(err) => {
                warn!("{}:{}: unterminated line: {}", path.display(), index, err);
                outcome.unterminated.push(UnterminatedLine {
                    file_path: path.display().to_string(),
                    line_index: index,
                    line_tail: line_tail(trimmed),
                });
            }
        }
    }

    debug!(
        "{}: streamed {} events, {} unterminated lines",
        path.display(),
        outcome.events,
        outcome.unterminated.len()
    );
    Ok(outcome)
}

/// Extract the events carried by one parsed line
///
/// **Private** - an array is the events themselves; an object with a
/// `type` field is a single event; otherwise container keys are searched,
/// so a small single-line export also lands here correctly.
fn line_events(value: serde_json::Value, depth: u8) -> Vec<serde_json::Value> {
    match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => {
            if map.contains_key("type") || depth >= MAX_CONTAINER_DEPTH {
                return vec![serde_json::Value::Object(map)];
            }
            let mut map = map;
            for field in CONTAINER_FIELD_NAMES {
                if let Some(inner) = map.remove(*field) {
                    if inner.is_array() || inner.is_object() {
                        return line_events(inner, depth + 1);
                    }
                }
            }
            vec![serde_json::Value::Object(map)]
        }
        _ => Vec::new(),
    }
}

/// Keep only the trailing characters of a truncated line
fn line_tail(line: &str) -> String {
    let count = line.chars().count();
    line.chars()
        .skip(count.saturating_sub(UNTERMINATED_TAIL_CHARS))
        .collect()
}
