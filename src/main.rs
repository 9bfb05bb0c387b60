//! Replay Lens CLI
//!
//! Aggregate statistics for exported rrweb session recordings.
//! Helps diagnose why a recording is abnormally large or unplayable.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use replay_lens::commands::{
    analyze, execute_analyze, execute_timestamps, AnalyzeArgs, TimestampsArgs,
};
use replay_lens::commands::timestamps;
use replay_lens::utils::config::{DEFAULT_TOP_MUTATIONS, SCHEMA_VERSION};

/// Replay Lens - size and structure statistics for session recordings
#[derive(Parser, Debug)]
#[command(name = "replay-lens")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a recording and print aggregate statistics
    Analyze {
        /// Recording file (.json/.jsonl) or directory of recording files
        path: PathBuf,

        /// Number of entries in the ranked mutation section
        #[arg(long, default_value_t = DEFAULT_TOP_MUTATIONS)]
        top: usize,

        /// Also write the report as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert event timestamps to ISO-8601 and resolve replay delays
    Timestamps {
        /// Recording file or directory of recording files
        path: PathBuf,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Analyze { path, top, output } => {
            let args = AnalyzeArgs {
                path,
                top,
                output_json: output,
            };

            analyze::validate_args(&args)?;
            execute_analyze(args)?;
        }

        Commands::Timestamps { path } => {
            let args = TimestampsArgs { path };

            timestamps::validate_args(&args)?;
            execute_timestamps(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Validate a report JSON file
///
/// **Private** - internal command implementation
fn validate_report_file(file_path: PathBuf) -> Result<()> {
    use replay_lens::output::read_report;

    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)?;

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Files: {}", report.files_analyzed);
    println!("  Events: {}", report.total_events);
    if let Some(start) = &report.session_start {
        println!("  Session start: {}", start);
    }
    println!("  Full snapshots: {}", report.full_snapshots.len());
    println!("  Unterminated lines: {}", report.unterminated_lines.len());

    Ok(())
}

/// Display schema information
///
/// **Private** - internal command implementation
fn display_schema(show_details: bool) {
    println!("Replay Lens Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  generated_at: string       - RFC 3339 generation timestamp");
        println!("  files_analyzed: number     - Recording files scanned");
        println!("  total_events: number       - Events classified");
        println!("  session_start: string?     - Earliest event time (ISO 8601)");
        println!("  session_end: string?       - Latest event time (ISO 8601)");
        println!("  duration_ms: number?       - Session length in milliseconds");
        println!("  event_type_counts: object  - Count per event type");
        println!("  incremental_source_counts  - Count and bytes per source");
        println!("  mutations: object          - Mutation breakdown");
        println!("    removals/texts           - Count and bytes");
        println!("    additions_by_node_type   - Count and bytes per node type");
        println!("    attributes_*             - Individual/grouped attribute stats");
        println!("  plugin_counts: object      - Count and bytes per plugin");
        println!("  console_log_counts: object - Count and bytes per log level");
        println!("  full_snapshots: array      - Timestamps with session offsets");
        println!("  attach_iframe_count        - isAttachIframe full snapshots");
        println!("  unterminated_lines: array  - Truncated lines encountered");
        println!("  top_mutations: array       - Mutation buckets ranked by size");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("Replay Lens v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Aggregate statistics for exported rrweb session recordings.");
}
