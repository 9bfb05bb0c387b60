//! Configuration and constants for the CLI.

/// Current JSON report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Default number of mutation buckets shown in the ranked section
pub const DEFAULT_TOP_MUTATIONS: usize = 10;

/// Upper bound for --top
pub const MAX_TOP_MUTATIONS: usize = 1000;

/// Plugin name prefix that marks console-log capture events
pub const CONSOLE_PLUGIN_PREFIX: &str = "rrweb/console";

// File extensions considered recording files when scanning a directory
pub const RECORDING_EXTENSIONS: &[&str] = &["json", "jsonl"];

// Field names for locating the event array inside an export wrapper
// (different exporters nest the snapshot list under different keys)
pub const CONTAINER_FIELD_NAMES: &[&str] = &["snapshots", "data", "events"];

/// How many trailing characters of a truncated line are kept for the report
pub const UNTERMINATED_TAIL_CHARS: usize = 40;
