//! Jank detection against a render budget.

use crate::parser::schema::{FrameEvent, FrameStats, JankResult};
use log::debug;

/// Classify frames against `budget_ms`
///
/// **Public** - main entry point for jank detection
///
/// # Arguments
/// * `frames` - Frame events, timestamp-ascending
/// * `budget_ms` - Frames strictly longer than this are jank
///
/// # Returns
/// The input frames unchanged plus the jank subset in the same order.
/// An empty input gives an empty result.
pub fn detect_jank(frames: &[FrameEvent], budget_ms: f64) -> JankResult {
    let jank_frames: Vec<FrameEvent> = frames
        .iter()
        .filter(|f| f.duration_ms > budget_ms)
        .copied()
        .collect();

    debug!(
        "{} of {} frames exceed {} ms",
        jank_frames.len(),
        frames.len(),
        budget_ms
    );

    JankResult {
        budget_ms,
        frames: frames.to_vec(),
        jank_frames,
    }
}

impl FrameStats {
    /// Summary statistics over a jank result
    pub fn from_result(result: &JankResult) -> Self {
        let frame_count = result.frames.len();
        if frame_count == 0 {
            return Self::default();
        }

        let total_ms: f64 = result.frames.iter().map(|f| f.duration_ms).sum();
        let max_frame_ms = result
            .frames
            .iter()
            .map(|f| f.duration_ms)
            .fold(0.0, f64::max);
        let jank_count = result.jank_frames.len();

        Self {
            frame_count,
            jank_count,
            jank_percentage: jank_count as f64 / frame_count as f64 * 100.0,
            mean_frame_ms: total_ms / frame_count as f64,
            max_frame_ms,
        }
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Frames: {} | Jank: {} ({:.1}%) | Mean: {:.2} ms | Max: {:.2} ms",
            self.frame_count, self.jank_count, self.jank_percentage, self.mean_frame_ms, self.max_frame_ms
        )
    }
}
