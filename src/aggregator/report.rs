//! Assemble analyzer outputs into a report and render its summary.
//!
//! No parsing or analysis happens here. Renderers and CLI printers depend on
//! `AnalysisReport` and the summary string only.

use crate::parser::schema::{AnalysisReport, CpuLoadSample, FrameStats, JankResult, StateBreakdown};
use std::collections::BTreeMap;

/// Combine analyzer outputs into a report
///
/// **Public** - main entry point for aggregation
pub fn build_report(
    cpu_load: BTreeMap<u32, CpuLoadSample>,
    jank: JankResult,
    frame_stats: FrameStats,
    sched_states: StateBreakdown,
) -> AnalysisReport {
    AnalysisReport {
        cpu_load,
        jank,
        frame_stats,
        sched_states,
    }
}

/// Deterministic human-readable summary
///
/// Lists the jank count with its threshold, then per-core utilization in
/// ascending core order.
pub fn summarize(report: &AnalysisReport) -> String {
    let jank_line = format!(
        "Jank frames: {} of {} (> {} ms)",
        report.jank.jank_frames.len(),
        report.jank.frames.len(),
        report.jank.budget_ms
    );

    if report.cpu_load.is_empty() {
        return format!("{}\nCPU utilization: no scheduling data", jank_line);
    }

    let mut lines = vec![jank_line, "CPU utilization:".to_string()];
    lines.extend(report.cpu_load.iter().map(|(cpu, sample)| {
        if sample.is_insufficient() {
            format!(
                "  CPU {}: {:.1}% (insufficient data)",
                cpu, sample.utilization_pct
            )
        } else {
            format!("  CPU {}: {:.1}%", cpu, sample.utilization_pct)
        }
    }));

    lines.join("\n")
}

impl AnalysisReport {
    /// See [`summarize`]
    pub fn summary(&self) -> String {
        summarize(self)
    }
}
