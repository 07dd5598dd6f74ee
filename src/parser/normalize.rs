//! Normalize raw capture events into scheduling and frame events.
//!
//! Rows of a structured relation are routed by their origin. Document events
//! are routed by category/name: `load` is scheduling, `Frame` under a frame
//! category is a frame. Times are converted to milliseconds using the
//! source's unit. Events that do not fit are dropped and counted,
//! never treated as errors: captures routinely carry unrelated categories.

use super::schema::{FrameEvent, SchedState, SchedulingEvent};
use super::source::{json_f64, EventOrigin, RawTraceEvent, TimeUnit};
use crate::utils::config::{FRAME_CATEGORIES, FRAME_EVENT_NAME, SCHED_CATEGORY};
use log::debug;
use serde_json::{Map, Value};

/// A raw event after routing
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedEvent {
    Scheduling(SchedulingEvent),
    Frame(FrameEvent),
}

/// Why an event was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No usable `ts` or `dur`
    MissingFields,
    /// Negative duration or negative cpu id
    InvalidValue,
    /// Category/name not interpreted
    Unrecognized,
}

/// Per-pass tally of dropped events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    pub missing_fields: usize,
    pub invalid_value: usize,
    pub unrecognized: usize,
}

impl DropCounts {
    fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::MissingFields => self.missing_fields += 1,
            DropReason::InvalidValue => self.invalid_value += 1,
            DropReason::Unrecognized => self.unrecognized += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing_fields + self.invalid_value + self.unrecognized
    }
}

/// Output of normalizing a whole capture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTrace {
    /// Scheduling events in source order
    pub scheduling: Vec<SchedulingEvent>,

    /// Frame events, timestamp-ascending
    pub frames: Vec<FrameEvent>,

    pub dropped: DropCounts,
}

/// Stateless mapper from raw events to canonical events
#[derive(Debug, Clone, Copy)]
pub struct EventNormalizer {
    unit: TimeUnit,
}

impl EventNormalizer {
    pub fn new(unit: TimeUnit) -> Self {
        Self { unit }
    }

    /// Route one event, or say why it was dropped
    pub fn normalize(&self, event: &RawTraceEvent) -> Result<NormalizedEvent, DropReason> {
        let (Some(ts), Some(dur)) = (event.timestamp, event.duration) else {
            return Err(DropReason::MissingFields);
        };

        let timestamp_ms = self.unit.to_millis(ts);
        let duration_ms = self.unit.to_millis(dur);

        if duration_ms < 0.0 || !duration_ms.is_finite() || !timestamp_ms.is_finite() {
            return Err(DropReason::InvalidValue);
        }

        if is_sched(event) {
            let cpu_id = match lookup(&event.extra, "cpu").and_then(json_f64) {
                None => 0,
                Some(cpu) if cpu >= 0.0 && cpu.fract() == 0.0 && cpu <= u32::MAX as f64 => {
                    cpu as u32
                }
                Some(_) => return Err(DropReason::InvalidValue),
            };

            let state = lookup(&event.extra, "state")
                .or_else(|| lookup(&event.extra, "end_state"))
                .and_then(Value::as_str)
                .map(SchedState::from_code)
                .unwrap_or(SchedState::Other);

            return Ok(NormalizedEvent::Scheduling(SchedulingEvent {
                timestamp_ms,
                duration_ms,
                cpu_id,
                process_name: lookup_string(&event.extra, "process_name"),
                thread_name: lookup_string(&event.extra, "thread_name"),
                state,
            }));
        }

        if is_frame(event) {
            return Ok(NormalizedEvent::Frame(FrameEvent::new(timestamp_ms, duration_ms)));
        }

        Err(DropReason::Unrecognized)
    }

    /// Normalize a full event stream
    ///
    /// **Public** - main entry point for normalization
    pub fn normalize_all(&self, events: impl IntoIterator<Item = RawTraceEvent>) -> NormalizedTrace {
        let mut trace = NormalizedTrace::default();

        for event in events {
            match self.normalize(&event) {
                Ok(NormalizedEvent::Scheduling(sched)) => trace.scheduling.push(sched),
                Ok(NormalizedEvent::Frame(frame)) => trace.frames.push(frame),
                Err(reason) => trace.dropped.record(reason),
            }
        }

        // Stable: frames sharing a timestamp keep source order
        trace
            .frames
            .sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));

        debug!(
            "Normalized {} scheduling events and {} frames ({} dropped: {} missing fields, {} invalid, {} unrecognized)",
            trace.scheduling.len(),
            trace.frames.len(),
            trace.dropped.total(),
            trace.dropped.missing_fields,
            trace.dropped.invalid_value,
            trace.dropped.unrecognized,
        );

        trace
    }
}

fn is_sched(event: &RawTraceEvent) -> bool {
    match event.origin {
        EventOrigin::SchedulingRelation => true,
        EventOrigin::FrameRelation => false,
        EventOrigin::Document => event.category == SCHED_CATEGORY,
    }
}

fn is_frame(event: &RawTraceEvent) -> bool {
    match event.origin {
        EventOrigin::FrameRelation => true,
        EventOrigin::SchedulingRelation => false,
        EventOrigin::Document => {
            FRAME_CATEGORIES.contains(&event.category.as_str()) && event.name == FRAME_EVENT_NAME
        }
    }
}

/// Look a field up on the event, then in its `args` object
fn lookup<'a>(extra: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    extra
        .get(key)
        .or_else(|| extra.get("args").and_then(|args| args.get(key)))
}

fn lookup_string(extra: &Map<String, Value>, key: &str) -> String {
    lookup(extra, key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
