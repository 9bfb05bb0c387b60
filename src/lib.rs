//! Replay Lens
//!
//! Aggregate statistics for exported rrweb session recordings, to help
//! diagnose why a recording is abnormally large or unplayable.
//!
//! This crate provides the core implementation for the
//! `replay-lens` CLI tool.
//!
//! ## Getting Started
//!
//! Most users should install and use the CLI:
//!
//! ```bash
//! cargo install replay-lens
//! replay-lens analyze recording.json
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;
