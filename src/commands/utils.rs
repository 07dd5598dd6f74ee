use crate::output::read_report;
use crate::utils::config::{DEFAULT_FRAME_BUDGET_MS, SCHEMA_VERSION};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Validate a report JSON file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let document = read_report(&file_path)
        .with_context(|| format!("Failed to read report {}", file_path.display()))?;

    if document.version != SCHEMA_VERSION {
        anyhow::bail!(
            "Unsupported report version {} (expected {})",
            document.version,
            SCHEMA_VERSION
        );
    }

    println!("✓ Valid report JSON");
    println!("  Version: {}", document.version);
    println!("  Capture: {} ({})", document.capture, document.format);
    println!("  Generated: {}", document.generated_at);
    println!("  Cores: {}", document.report.cpu_load.len());
    println!(
        "  Frames: {} ({} over {} ms)",
        document.report.jank.frames.len(),
        document.report.jank.jank_frames.len(),
        document.report.jank.budget_ms
    );

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Frametrace Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string              - Schema version (e.g., '1.0.0')");
        println!("  capture: string              - Capture file path");
        println!("  format: string               - 'embedded' or 'structured'");
        println!("  generated_at: string         - ISO 8601 timestamp");
        println!("  capture_duration_hint: number? - Capture length in seconds");
        println!("  summary: string              - Human-readable summary");
        println!("  report: object");
        println!("    cpu_load: object           - Keyed by core id");
        println!("      event_count: number      - Scheduling events on the core");
        println!("      utilization_pct: number  - Busy time over the core's own window");
        println!("      series: array            - (timestamp_ms, duration_ms) points");
        println!("    jank: object");
        println!("      budget_ms: number        - Budget used (default {})", DEFAULT_FRAME_BUDGET_MS);
        println!("      frames: array            - All frames, timestamp-ascending");
        println!("      jank_frames: array       - Frames over budget");
        println!("    frame_stats: object        - Count, jank %, mean and max frame time");
        println!("    sched_states: object       - Scheduling events per run-state");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Frametrace v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("CPU load and jank analysis for systrace and Perfetto-style captures.");
}
