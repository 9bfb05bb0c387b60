//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Resolves the input path to one or more recording files
//! 2. Streams each file through the aggregation pass
//! 3. Merges per-file analyses and builds the report
//! 4. Prints the text report (and optionally writes JSON)

use crate::aggregator::Analysis;
use crate::output::{render_text, write_report, Report};
use crate::parser::{recording_paths, scan_recording};
use crate::utils::config::{DEFAULT_TOP_MUTATIONS, MAX_TOP_MUTATIONS};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Recording file or directory of recording files
    pub path: PathBuf,

    /// Number of entries in the ranked mutation section
    pub top: usize,

    /// Optional path for a JSON copy of the report
    pub output_json: Option<PathBuf>,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            top: DEFAULT_TOP_MUTATIONS,
            output_json: None,
        }
    }
}

/// Validate analyze arguments
///
/// **Public** - called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.path.as_os_str().is_empty() {
        anyhow::bail!("recording path cannot be empty");
    }

    if args.top == 0 {
        anyhow::bail!("--top must be greater than 0");
    }

    if args.top > MAX_TOP_MUTATIONS {
        anyhow::bail!("--top is too large (max {})", MAX_TOP_MUTATIONS);
    }

    if let Some(output) = &args.output_json {
        if output.as_os_str().is_empty() {
            anyhow::bail!("--output path cannot be empty");
        }
    }

    Ok(())
}

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Unreadable or unrecognized recording files
/// * Report file write errors
pub fn execute_analyze(args: AnalyzeArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Analyzing recording: {}", args.path.display());

    // Step 1: Resolve input files
    info!("Step 1/4: Resolving recording files...");
    let paths = recording_paths(&args.path)
        .with_context(|| format!("failed to resolve {}", args.path.display()))?;
    info!("Found {} recording file(s)", paths.len());

    // Step 2: Stream every file through the aggregation pass
    info!("Step 2/4: Scanning events...");
    let mut analysis = Analysis::new();
    for path in &paths {
        let mut file_analysis = Analysis::new();
        let outcome = scan_recording(path, &mut |event| file_analysis.record_event(&event))
            .with_context(|| format!("failed to analyze {}", path.display()))?;

        debug!(
            "{}: {} events, {} unterminated lines",
            path.display(),
            outcome.events,
            outcome.unterminated.len()
        );

        file_analysis.note_scan(outcome);
        analysis.merge(file_analysis);
    }

    info!(
        "Classified {} events across {} file(s)",
        analysis.total_events, analysis.files_analyzed
    );

    // Step 3: Build the report
    info!("Step 3/4: Building report...");
    let report = Report::from_analysis(&analysis, args.top);

    // Step 4: Render outputs
    info!("Step 4/4: Rendering report...");
    println!("{}", render_text(&report));

    if let Some(output_path) = &args.output_json {
        write_report(&report, output_path)
            .with_context(|| format!("failed to write report to {}", output_path.display()))?;
        info!("✓ Report written to: {}", output_path.display());
    }

    let elapsed = start_time.elapsed();
    info!("Analysis completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_args_valid() {
        let args = AnalyzeArgs {
            path: PathBuf::from("recording.json"),
            ..Default::default()
        };

        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_empty_path() {
        let args = AnalyzeArgs::default();
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_top_zero() {
        let args = AnalyzeArgs {
            path: PathBuf::from("recording.json"),
            top: 0,
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_top_too_large() {
        let args = AnalyzeArgs {
            path: PathBuf::from("recording.json"),
            top: MAX_TOP_MUTATIONS + 1,
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_empty_output() {
        let args = AnalyzeArgs {
            path: PathBuf::from("recording.json"),
            output_json: Some(PathBuf::new()),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_execute_analyze_missing_path() {
        let args = AnalyzeArgs {
            path: PathBuf::from("/nonexistent/recording.json"),
            ..Default::default()
        };

        assert!(execute_analyze(args).is_err());
    }
}
