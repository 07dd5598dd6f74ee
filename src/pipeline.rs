//! One analysis pass: source → normalizer → analyzers → report.
//!
//! Every call builds its own state and returns an owned report, so passes
//! over different captures can run side by side without coordination.

use crate::aggregator::build_report;
use crate::analyzer::{analyze_cpu_load, count_states, detect_jank};
use crate::parser::{open_capture, AnalysisReport, CaptureFormat, EventNormalizer, FrameStats, TraceSource};
use crate::utils::config::AnalysisConfig;
use crate::utils::error::{AnalysisError, CaptureError};
use log::{debug, info, warn};
use std::path::Path;

/// Analyze a capture file
///
/// **Public** - main entry point for library callers
///
/// # Arguments
/// * `path` - Capture file
/// * `format` - Force a capture format, or `None` to detect it
/// * `config` - Per-call analysis settings
///
/// # Errors
/// Any capture-level failure aborts the pass; the error names the capture
/// path and the failing stage. No partial report is returned.
pub fn analyze_capture(
    path: impl AsRef<Path>,
    format: Option<CaptureFormat>,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    let path = path.as_ref();
    info!("Analyzing capture: {}", path.display());

    let source = open_capture(path, format).map_err(|e| AnalysisError::new(path, e))?;
    analyze_source(source, config).map_err(|e| AnalysisError::new(path, e))
}

/// Analyze an already-opened source
pub fn analyze_source(
    source: Box<dyn TraceSource>,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, CaptureError> {
    if let Some(seconds) = config.capture_duration_hint {
        debug!("Capture duration hint: {}s", seconds);
    }

    let format = source.format();
    let normalizer = EventNormalizer::new(source.time_unit());
    let events = source.events()?;

    let trace = normalizer.normalize_all(events);
    if trace.dropped.missing_fields > 0 || trace.dropped.invalid_value > 0 {
        warn!(
            "Dropped {} events without usable ts/dur and {} with invalid values",
            trace.dropped.missing_fields, trace.dropped.invalid_value
        );
    }

    info!(
        "{} capture: {} scheduling events, {} frames",
        format,
        trace.scheduling.len(),
        trace.frames.len()
    );

    let cpu_load = analyze_cpu_load(&trace.scheduling);
    let sched_states = count_states(&trace.scheduling);
    let jank = detect_jank(&trace.frames, config.frame_budget_ms);
    let frame_stats = FrameStats::from_result(&jank);

    info!("{}", frame_stats.summary());

    Ok(build_report(cpu_load, jank, frame_stats, sched_states))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::EmbeddedScriptSource;
    use crate::utils::error::Stage;

    #[test]
    fn test_analyze_source_embedded() {
        let doc = r#"var traceEvents = [
            {"cat": "load", "ts": 0, "dur": 5000},
            {"cat": "load", "ts": 5000, "dur": 5000},
            {"cat": "load", "ts": 20000, "dur": 10000},
            {"cat": "gfx", "name": "Frame", "ts": 0, "dur": 10000},
            {"cat": "gfx", "name": "Frame", "ts": 16000, "dur": 20000},
            {"cat": "view", "name": "Frame", "ts": 40000, "dur": 15000}
        ];"#;

        let source = Box::new(EmbeddedScriptSource::from_document(doc));
        let report = analyze_source(source, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.cpu_load.len(), 1);
        assert_eq!(report.cpu_load[&0].utilization_pct, 100.0);
        assert_eq!(report.jank.frames.len(), 3);
        assert_eq!(report.jank.jank_frames.len(), 1);
        assert_eq!(report.jank.jank_frames[0].timestamp_ms, 16.0);
    }

    #[test]
    fn test_budget_is_per_call() {
        let doc = r#"var traceEvents = [{"cat": "gfx", "name": "Frame", "ts": 0, "dur": 12000}];"#;

        let strict = AnalysisConfig::default().with_frame_budget(8.3);
        let report = analyze_source(Box::new(EmbeddedScriptSource::from_document(doc)), &strict).unwrap();
        assert_eq!(report.jank.jank_frames.len(), 1);

        let report = analyze_source(
            Box::new(EmbeddedScriptSource::from_document(doc)),
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert!(report.jank.jank_frames.is_empty());
    }

    #[test]
    fn test_analyze_capture_missing_file() {
        let err = analyze_capture("/nonexistent/trace.html", None, &AnalysisConfig::default())
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Open);
        assert!(err.to_string().contains("/nonexistent/trace.html"));
    }
}
