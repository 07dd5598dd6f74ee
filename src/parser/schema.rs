//! Normalized event and report schema definitions.
//!
//! Everything downstream of the normalizer works in milliseconds and only
//! sees the types defined here. `AnalysisReport` is what we hand to callers
//! and what the JSON report wraps.

use super::source::CaptureFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Run-state of a thread in a scheduling slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchedState {
    Runnable,
    Sleeping,
    UninterruptibleSleep,
    Other,
}

impl SchedState {
    /// Map a kernel state code (`R`, `S`, `D`, ...) or spelled-out name
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "R" | "R+" | "Running" | "Runnable" => SchedState::Runnable,
            "S" | "Sleeping" => SchedState::Sleeping,
            "D" | "UninterruptibleSleep" => SchedState::UninterruptibleSleep,
            _ => SchedState::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SchedState::Runnable => "runnable",
            SchedState::Sleeping => "sleeping",
            SchedState::UninterruptibleSleep => "uninterruptible",
            SchedState::Other => "other",
        }
    }
}

/// A thread occupying a CPU core for an interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingEvent {
    pub timestamp_ms: f64,
    pub duration_ms: f64,
    pub cpu_id: u32,
    pub process_name: String,
    pub thread_name: String,
    pub state: SchedState,
}

/// One rendered frame's wall-clock render time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameEvent {
    pub timestamp_ms: f64,
    pub duration_ms: f64,
}

impl FrameEvent {
    pub fn new(timestamp_ms: f64, duration_ms: f64) -> Self {
        Self {
            timestamp_ms,
            duration_ms,
        }
    }
}

/// One point of a core's activity series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadPoint {
    pub timestamp_ms: f64,
    pub duration_ms: f64,
}

/// Utilization and activity series for a single core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuLoadSample {
    /// Scheduling events observed on this core
    pub event_count: usize,

    /// Busy time over the core's own first-to-last event window, in percent.
    /// Not clamped: overlapping slices can push it past 100.
    pub utilization_pct: f64,

    /// Raw (timestamp, duration) pairs in source order
    pub series: Vec<LoadPoint>,
}

impl CpuLoadSample {
    /// True when the core had too few events to define a window
    pub fn is_insufficient(&self) -> bool {
        self.event_count < 2
    }
}

/// Frames classified against a render budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JankResult {
    /// Budget the classification used
    pub budget_ms: f64,

    /// All frames, timestamp-ascending
    pub frames: Vec<FrameEvent>,

    /// Frames whose duration is strictly greater than the budget
    pub jank_frames: Vec<FrameEvent>,
}

impl JankResult {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Summary statistics over all frames
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameStats {
    pub frame_count: usize,
    pub jank_count: usize,
    pub jank_percentage: f64,
    pub mean_frame_ms: f64,
    pub max_frame_ms: f64,
}

/// Number of scheduling events per run-state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBreakdown {
    pub runnable: usize,
    pub sleeping: usize,
    pub uninterruptible: usize,
    pub other: usize,
}

impl StateBreakdown {
    pub fn total(&self) -> usize {
        self.runnable + self.sleeping + self.uninterruptible + self.other
    }
}

/// Result of one analysis pass over one capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Per-core load keyed by core id (ordered)
    pub cpu_load: BTreeMap<u32, CpuLoadSample>,

    /// Frame series and jank subset
    pub jank: JankResult,

    /// Frame-time statistics
    pub frame_stats: FrameStats,

    /// Scheduling events per run-state
    pub sched_states: StateBreakdown,
}

/// Top-level report document written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    /// Schema version for compatibility checking
    pub version: String,

    /// Capture the report was computed from
    pub capture: String,

    /// Format the capture was decoded as
    pub format: CaptureFormat,

    /// Timestamp when the report was generated
    pub generated_at: String,

    /// Capture length in seconds, if the caller knew it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_duration_hint: Option<u32>,

    /// Rendered summary text
    pub summary: String,

    pub report: AnalysisReport,
}
