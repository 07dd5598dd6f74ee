//! Per-core CPU utilization from scheduling events.
//!
//! Each core is measured against its own observation window, from its first
//! to its last event timestamp, rather than the capture-wide window. A core
//! that only wakes up halfway through the capture is therefore not diluted
//! by the half where it had nothing recorded.
//!
//! The formula sums event durations, so overlapping slices on one core are
//! counted twice and utilization can exceed 100%. It is reported as-is.

use crate::parser::schema::{CpuLoadSample, LoadPoint, SchedulingEvent};
use log::debug;
use std::collections::BTreeMap;

/// Compute utilization and activity series for every observed core
///
/// **Public** - main entry point for CPU load analysis
///
/// # Arguments
/// * `events` - Normalized scheduling events in source order
///
/// # Returns
/// One sample per distinct `cpu_id`, ordered by core id
pub fn analyze_cpu_load(events: &[SchedulingEvent]) -> BTreeMap<u32, CpuLoadSample> {
    let mut by_core: BTreeMap<u32, Vec<&SchedulingEvent>> = BTreeMap::new();
    for event in events {
        by_core.entry(event.cpu_id).or_default().push(event);
    }

    let samples: BTreeMap<u32, CpuLoadSample> = by_core
        .into_iter()
        .map(|(cpu, core_events)| (cpu, core_sample(&core_events)))
        .collect();

    for (cpu, sample) in &samples {
        debug!(
            "CPU {}: {} events, {:.1}% utilization",
            cpu, sample.event_count, sample.utilization_pct
        );
    }

    samples
}

/// Build the sample for a single core
///
/// **Private** - internal helper for analyze_cpu_load
fn core_sample(events: &[&SchedulingEvent]) -> CpuLoadSample {
    if events.len() < 2 {
        return CpuLoadSample {
            event_count: events.len(),
            utilization_pct: 0.0,
            series: Vec::new(),
        };
    }

    let busy_ms: f64 = events.iter().map(|e| e.duration_ms).sum();
    let start = events
        .iter()
        .map(|e| e.timestamp_ms)
        .fold(f64::INFINITY, f64::min);
    let end = events
        .iter()
        .map(|e| e.timestamp_ms)
        .fold(f64::NEG_INFINITY, f64::max);
    let window_ms = end - start;

    let utilization_pct = if window_ms > 0.0 {
        busy_ms / window_ms * 100.0
    } else {
        0.0
    };

    CpuLoadSample {
        event_count: events.len(),
        utilization_pct,
        series: events
            .iter()
            .map(|e| LoadPoint {
                timestamp_ms: e.timestamp_ms,
                duration_ms: e.duration_ms,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::SchedState;

    fn sched(cpu_id: u32, timestamp_ms: f64, duration_ms: f64) -> SchedulingEvent {
        SchedulingEvent {
            timestamp_ms,
            duration_ms,
            cpu_id,
            process_name: "app".to_string(),
            thread_name: "main".to_string(),
            state: SchedState::Runnable,
        }
    }

    #[test]
    fn test_three_events_full_utilization() {
        let events = vec![sched(0, 0.0, 5.0), sched(0, 5.0, 5.0), sched(0, 20.0, 10.0)];
        let load = analyze_cpu_load(&events);

        assert_eq!(load.len(), 1);
        assert_eq!(load[&0].utilization_pct, 100.0);
        assert_eq!(load[&0].event_count, 3);
        assert_eq!(load[&0].series.len(), 3);
    }

    #[test]
    fn test_single_event_core_is_zero_and_empty() {
        let events = vec![sched(0, 0.0, 5.0), sched(0, 10.0, 5.0), sched(3, 4.0, 2.0)];
        let load = analyze_cpu_load(&events);

        assert_eq!(load[&3].utilization_pct, 0.0);
        assert!(load[&3].series.is_empty());
        assert!(load[&3].is_insufficient());
    }

    #[test]
    fn test_zero_width_window_reports_zero() {
        let events = vec![sched(1, 7.0, 2.0), sched(1, 7.0, 3.0)];
        let load = analyze_cpu_load(&events);

        assert_eq!(load[&1].utilization_pct, 0.0);
        assert_eq!(load[&1].series.len(), 2);
    }

    #[test]
    fn test_overlapping_events_exceed_hundred_percent() {
        // busy 20ms over a 1ms window
        let events = vec![sched(0, 0.0, 10.0), sched(0, 1.0, 10.0)];
        let load = analyze_cpu_load(&events);
        assert_eq!(load[&0].utilization_pct, 2000.0);
    }

    #[test]
    fn test_per_core_window_not_global() {
        // cpu 1 is only active late; its window is [90, 100], not [0, 100]
        let events = vec![
            sched(0, 0.0, 10.0),
            sched(0, 100.0, 10.0),
            sched(1, 90.0, 5.0),
            sched(1, 100.0, 5.0),
        ];
        let load = analyze_cpu_load(&events);

        assert_eq!(load[&0].utilization_pct, 20.0);
        assert_eq!(load[&1].utilization_pct, 100.0);
    }

    #[test]
    fn test_series_keeps_source_order() {
        let events = vec![sched(0, 20.0, 1.0), sched(0, 0.0, 2.0), sched(0, 10.0, 3.0)];
        let load = analyze_cpu_load(&events);
        let ts: Vec<f64> = load[&0].series.iter().map(|p| p.timestamp_ms).collect();
        assert_eq!(ts, vec![20.0, 0.0, 10.0]);
        // window is still min..max
        assert_eq!(load[&0].utilization_pct, 30.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(analyze_cpu_load(&[]).is_empty());
    }
}
