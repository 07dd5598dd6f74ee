//! Frametrace CLI
//!
//! CPU load and jank analysis for device performance captures.
//! Reads a systrace HTML or trace-processor database and reports per-core
//! utilization and frames over the render budget.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use frametrace::commands::{
    display_schema, display_version, execute_analyze, validate_args, validate_report_file,
    AnalyzeArgs,
};
use frametrace::parser::CaptureFormat;

/// Frametrace - CPU load and jank analysis for device captures
#[derive(Parser, Debug)]
#[command(name = "frametrace")]
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
    /// Analyze a capture file
    Analyze {
        /// Capture file (systrace HTML, trace JSON, or trace database)
        capture: PathBuf,

        /// Capture format (embedded, structured); detected when omitted
        #[arg(long)]
        format: Option<CaptureFormat>,

        /// Frame render budget in milliseconds
        #[arg(short, long, env = "FRAMETRACE_FRAME_BUDGET_MS")]
        budget: Option<f64>,

        /// TOML analysis config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Capture length in seconds (informational)
        #[arg(long)]
        duration_hint: Option<u32>,

        /// Output path for JSON report (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not print the text summary
        #[arg(short, long)]
        quiet: bool,
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
        Commands::Analyze {
            capture,
            format,
            budget,
            config,
            duration_hint,
            output,
            quiet,
        } => {
            let args = AnalyzeArgs {
                capture,
                format,
                config_file: config,
                frame_budget_ms: budget,
                duration_hint,
                output_json: output,
                print_summary: !quiet,
            };

            // Validate args first
            validate_args(&args)?;

            execute_analyze(args)?;
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
