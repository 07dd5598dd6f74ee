//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Resolves the analysis config (file, then CLI overrides)
//! 2. Opens the capture with the right source
//! 3. Runs one analysis pass
//! 4. Prints the summary
//! 5. Writes the JSON report (if requested)

use crate::output::{to_document, write_report};
use crate::parser::{open_capture, CaptureFormat, SchedState};
use crate::pipeline::analyze_source;
use crate::utils::config::AnalysisConfig;
use crate::utils::error::AnalysisError;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Capture file to analyze
    pub capture: PathBuf,

    /// Forced capture format (None = detect)
    pub format: Option<CaptureFormat>,

    /// TOML config file
    pub config_file: Option<PathBuf>,

    /// Frame budget override in milliseconds
    pub frame_budget_ms: Option<f64>,

    /// Capture length in seconds (informational)
    pub duration_hint: Option<u32>,

    /// Output path for JSON report (optional)
    pub output_json: Option<PathBuf>,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            capture: PathBuf::new(),
            format: None,
            config_file: None,
            frame_budget_ms: None,
            duration_hint: None,
            output_json: None,
            print_summary: true,
        }
    }
}

/// Build the effective config: defaults, then the file, then CLI flags
///
/// **Public** - can be called before execute_analyze for early validation
pub fn resolve_config(args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config_file {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(budget) = args.frame_budget_ms {
        config = config.with_frame_budget(budget);
    }
    if args.duration_hint.is_some() {
        config = config.with_duration_hint(args.duration_hint);
    }

    config.validate().context("Invalid analysis config")?;
    Ok(config)
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.capture.as_os_str().is_empty() {
        anyhow::bail!("Capture path cannot be empty");
    }

    if !args.capture.exists() {
        anyhow::bail!("Capture not found: {}", args.capture.display());
    }

    if args.capture.is_dir() {
        anyhow::bail!("Capture path is a directory: {}", args.capture.display());
    }

    if let Some(budget) = args.frame_budget_ms {
        if !budget.is_finite() || budget <= 0.0 {
            anyhow::bail!("Frame budget must be a positive number of milliseconds");
        }
    }

    Ok(())
}

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
pub fn execute_analyze(args: AnalyzeArgs) -> Result<()> {
    let start_time = Instant::now();
    let config = resolve_config(&args)?;

    info!("Starting analysis of: {}", args.capture.display());
    debug!("Analysis config: {:?}", config);

    // Step 1: Open capture
    info!("Step 1/3: Opening capture...");
    let source = open_capture(&args.capture, args.format)
        .map_err(|e| AnalysisError::new(&args.capture, e))?;
    let format = source.format();

    // Step 2: Analyze
    info!("Step 2/3: Analyzing {} capture...", format);
    let report = analyze_source(source, &config)
        .map_err(|e| AnalysisError::new(&args.capture, e))?;

    // Step 3: Write outputs
    info!("Step 3/3: Writing output...");

    if args.print_summary {
        let states = &report.sched_states;
        println!("\n{}", "=".repeat(60));
        println!("CAPTURE ANALYSIS");
        println!("{}", "=".repeat(60));
        println!("Capture: {} ({})", args.capture.display(), format);
        if let Some(seconds) = config.capture_duration_hint {
            println!("Duration: {}s", seconds);
        }
        println!("{}", report.frame_stats.summary());
        println!(
            "Scheduling: {} events ({} {}, {} {}, {} {}, {} {})",
            states.total(),
            states.runnable,
            SchedState::Runnable.label(),
            states.sleeping,
            SchedState::Sleeping.label(),
            states.uninterruptible,
            SchedState::UninterruptibleSleep.label(),
            states.other,
            SchedState::Other.label(),
        );
        println!();
        println!("{}", report.summary());
        println!("{}", "=".repeat(60));
    }

    if let Some(output_path) = &args.output_json {
        let document = to_document(report, &args.capture, format, config.capture_duration_hint);
        write_report(&document, output_path).context("Failed to write report JSON")?;
        info!("✓ Report written to: {}", output_path.display());
    }

    let elapsed = start_time.elapsed();
    info!("Analysis completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}
