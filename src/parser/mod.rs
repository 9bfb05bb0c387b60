//! Recording parsing and event model.
//!
//! This module handles:
//! - Detecting the on-disk shape of an exported recording
//! - Streaming events out of very large files without buffering them
//! - The rrweb event/source/node code tables

pub mod recording;
pub mod schema;

// Re-export main types
pub use recording::{recording_paths, scan_recording, RecordingFormat, ScanOutcome};
pub use schema::{
    EventType, IncrementalSource, NodeType, RecordingEvent, UnterminatedLine,
};
