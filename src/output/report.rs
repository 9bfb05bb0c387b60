//! Report schema and text rendering.
//!
//! `Report` is the versioned, serializable snapshot of an `Analysis`:
//! deterministic key order (BTreeMaps), timestamps resolved to ISO-8601,
//! and the ranked mutation view precomputed. The same structure backs the
//! text report printed to stdout and the optional JSON file.

use crate::aggregator::{Analysis, SizedCount};
use crate::parser::schema::UnterminatedLine;
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::format::{format_duration_ms, format_timestamp_ms, human_bytes};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

/// Top-level report structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Schema version for compatibility checking
    pub version: String,

    /// Timestamp when the report was generated (RFC 3339)
    pub generated_at: String,

    /// Files scanned
    pub files_analyzed: u64,

    /// Events classified
    pub total_events: u64,

    /// Earliest event time (ISO-8601 UTC), absent for empty recordings
    pub session_start: Option<String>,

    /// Latest event time (ISO-8601 UTC)
    pub session_end: Option<String>,

    /// Session length in milliseconds
    pub duration_ms: Option<i64>,

    /// Event type label -> count
    pub event_type_counts: BTreeMap<String, u64>,

    /// Incremental source label -> count and cumulative size
    pub incremental_source_counts: BTreeMap<String, SizedCount>,

    /// Mutation breakdown
    pub mutations: MutationSummary,

    /// Plugin name -> count and cumulative size
    pub plugin_counts: BTreeMap<String, SizedCount>,

    /// Console log level -> count and cumulative size
    pub console_log_counts: BTreeMap<String, SizedCount>,

    /// Full DOM snapshots with offsets from session start
    pub full_snapshots: Vec<FullSnapshotEntry>,

    /// Full snapshots flagged `isAttachIframe`
    pub attach_iframe_count: u64,

    /// Lines that failed to parse
    pub unterminated_lines: Vec<UnterminatedLine>,

    /// Mutation buckets ranked by cumulative size, truncated to top N
    pub top_mutations: Vec<RankedBucket>,
}

/// Mutation statistics section of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationSummary {
    pub removals: SizedCount,
    pub texts: SizedCount,
    pub additions_by_node_type: BTreeMap<String, SizedCount>,
    pub attributes_individual: BTreeMap<String, SizedCount>,
    pub attributes_grouped: BTreeMap<String, SizedCount>,
    pub addition_count: u64,
    pub largest_addition_bytes: u64,
    pub median_addition_bytes: u64,
}

/// One full snapshot with its place in the session timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullSnapshotEntry {
    pub timestamp_ms: i64,
    pub time: Option<String>,
    pub offset_ms: Option<i64>,
}

/// One entry of the ranked top-mutations view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedBucket {
    pub label: String,
    pub count: u64,
    pub bytes: u64,
}

impl Report {
    /// Build a report from an analysis
    ///
    /// **Public** - used by the analyze command to create final output
    pub fn from_analysis(analysis: &Analysis, top_n: usize) -> Self {
        let mut addition_sizes = analysis.addition_sizes.clone();
        addition_sizes.sort_unstable();
        let largest = addition_sizes.last().copied().unwrap_or(0);
        let median = if addition_sizes.is_empty() {
            0
        } else {
            addition_sizes[addition_sizes.len() / 2]
        };

        let full_snapshots = analysis
            .full_snapshot_timestamps
            .iter()
            .map(|&timestamp_ms| FullSnapshotEntry {
                timestamp_ms,
                time: format_timestamp_ms(timestamp_ms),
                offset_ms: analysis.first_timestamp.map(|first| timestamp_ms - first),
            })
            .collect();

        Report {
            version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            files_analyzed: analysis.files_analyzed,
            total_events: analysis.total_events,
            session_start: analysis.first_timestamp.and_then(format_timestamp_ms),
            session_end: analysis.last_timestamp.and_then(format_timestamp_ms),
            duration_ms: analysis.duration_ms(),
            event_type_counts: analysis.event_type_counts.clone().into_iter().collect(),
            incremental_source_counts: analysis
                .incremental_source_counts
                .clone()
                .into_iter()
                .collect(),
            mutations: MutationSummary {
                removals: analysis.removals,
                texts: analysis.texts,
                additions_by_node_type: analysis.addition_counts.clone().into_iter().collect(),
                attributes_individual: analysis
                    .attributes_individual
                    .clone()
                    .into_iter()
                    .collect(),
                attributes_grouped: analysis.attributes_grouped.clone().into_iter().collect(),
                addition_count: analysis.addition_sizes.len() as u64,
                largest_addition_bytes: largest,
                median_addition_bytes: median,
            },
            plugin_counts: analysis.plugin_counts.clone().into_iter().collect(),
            console_log_counts: analysis.console_log_counts.clone().into_iter().collect(),
            full_snapshots,
            attach_iframe_count: analysis.attach_iframe_count,
            unterminated_lines: analysis.unterminated_lines.clone(),
            top_mutations: rank_by_size(&analysis.mutation_overview(), top_n),
        }
    }
}

/// Rank buckets by cumulative size, descending, truncated to `top_n`
///
/// **Public** - ties break on the label so output is deterministic.
pub fn rank_by_size(buckets: &HashMap<String, SizedCount>, top_n: usize) -> Vec<RankedBucket> {
    let mut ranked: Vec<RankedBucket> = buckets
        .iter()
        .map(|(label, sized)| RankedBucket {
            label: label.clone(),
            count: sized.count,
            bytes: sized.bytes,
        })
        .collect();
    ranked.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.label.cmp(&b.label)));
    ranked.truncate(top_n);
    ranked
}

/// Render the report as the text printed to stdout
///
/// **Public** - the primary output of the tool
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let rule = "=".repeat(80);

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "RECORDING ANALYSIS");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "Events: {} across {} file(s)",
        report.total_events, report.files_analyzed
    );

    if let (Some(start), Some(duration)) = (&report.session_start, report.duration_ms) {
        let _ = writeln!(out, "Session start:    {}", start);
        let _ = writeln!(out, "Session duration: {}", format_duration_ms(duration));
    } else {
        let _ = writeln!(out, "Session timeline: no timestamps in recording");
    }

    if !report.full_snapshots.is_empty() {
        let _ = writeln!(out, "\nFull snapshots:");
        for snapshot in &report.full_snapshots {
            let time = snapshot.time.as_deref().unwrap_or("<unrepresentable>");
            match snapshot.offset_ms {
                Some(offset) => {
                    let _ = writeln!(
                        out,
                        "  {} (after {})",
                        time,
                        format_duration_ms(offset)
                    );
                }
                None => {
                    let _ = writeln!(out, "  {}", time);
                }
            }
        }
    }

    let _ = writeln!(out, "\nEvent type counts:");
    for (label, count) in &report.event_type_counts {
        let _ = writeln!(out, "  {}: {}", label, count);
    }

    if !report.incremental_source_counts.is_empty() {
        let _ = writeln!(out, "\nIncremental snapshot sources (by size):");
        for (label, sized) in sorted_by_size(&report.incremental_source_counts) {
            let _ = writeln!(out, "  {}: {}", label, sized);
        }
    }

    render_mutations(&mut out, &report.mutations);

    let _ = writeln!(
        out,
        "\nUnterminated lines: {}",
        report.unterminated_lines.len()
    );
    for line in &report.unterminated_lines {
        let _ = writeln!(
            out,
            "  {}:{}: ...{}",
            line.file_path, line.line_index, line.line_tail
        );
    }

    let _ = writeln!(
        out,
        "Attach-iframe full snapshots: {}",
        report.attach_iframe_count
    );

    if !report.plugin_counts.is_empty() {
        let _ = writeln!(out, "\nPlugins:");
        for (label, sized) in sorted_by_size(&report.plugin_counts) {
            let _ = writeln!(out, "  {}: {}", label, sized);
        }
    }

    if !report.console_log_counts.is_empty() {
        let _ = writeln!(out, "\nConsole logs:");
        for (label, sized) in sorted_by_size(&report.console_log_counts) {
            let _ = writeln!(out, "  {}: {}", label, sized);
        }
    }

    let _ = writeln!(
        out,
        "\nTop {} mutation buckets by size:",
        report.top_mutations.len()
    );
    for bucket in &report.top_mutations {
        let _ = writeln!(
            out,
            "  {}: {} ({})",
            bucket.label,
            bucket.count,
            human_bytes(bucket.bytes)
        );
    }
    let _ = writeln!(out, "{}", rule);

    out
}

fn render_mutations(out: &mut String, mutations: &MutationSummary) {
    let _ = writeln!(out, "\nMutations:");
    let _ = writeln!(out, "  removals: {}", mutations.removals);
    let _ = writeln!(out, "  text changes: {}", mutations.texts);

    if !mutations.additions_by_node_type.is_empty() {
        let _ = writeln!(out, "  additions by node type:");
        for (label, sized) in sorted_by_size(&mutations.additions_by_node_type) {
            let _ = writeln!(out, "    {}: {}", label, sized);
        }
        let _ = writeln!(
            out,
            "  additions: {} (largest {}, median {})",
            mutations.addition_count,
            human_bytes(mutations.largest_addition_bytes),
            human_bytes(mutations.median_addition_bytes)
        );
    }

    if !mutations.attributes_individual.is_empty() {
        let _ = writeln!(out, "  attribute changes (individual):");
        for (label, sized) in sorted_by_size(&mutations.attributes_individual) {
            let _ = writeln!(out, "    {}: {}", label, sized);
        }
    }

    if !mutations.attributes_grouped.is_empty() {
        // Attribute mutations arrive in arrays; this shows which
        // attributes were changed together.
        let _ = writeln!(out, "  attribute changes (grouped):");
        for (label, sized) in sorted_by_size(&mutations.attributes_grouped) {
            let _ = writeln!(out, "    {}: {}", label, sized);
        }
    }
}

fn sorted_by_size(map: &BTreeMap<String, SizedCount>) -> Vec<(&String, &SizedCount)> {
    let mut entries: Vec<(&String, &SizedCount)> = map.iter().collect();
    entries.sort_by(|a, b| b.1.bytes.cmp(&a.1.bytes).then_with(|| a.0.cmp(b.0)));
    entries
}
