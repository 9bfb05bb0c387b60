//! Aggregation of recording events into per-category statistics.
//!
//! This module transforms the event stream into:
//! - Per-type and per-source count/size buckets
//! - Mutation breakdowns (additions, removals, texts, attributes)
//! - Session timeline facts (timestamps, full snapshots)

pub mod analysis;
pub mod sized_count;

// Re-export main types and functions
pub use analysis::{serialized_size, Analysis};
pub use sized_count::SizedCount;
