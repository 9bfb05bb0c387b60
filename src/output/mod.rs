//! Output for analysis results.
//!
//! This module handles:
//! - The versioned report schema and its text rendering
//! - Writing and reading JSON report files

pub mod json;
pub mod report;

// Re-export main functions
pub use json::{read_report, write_report};
pub use report::{render_text, rank_by_size, Report};
