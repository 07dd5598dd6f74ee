//! Capture decoding, normalization and schema definitions.
//!
//! This module handles:
//! - Decoding embedded-script and structured captures into raw events
//! - Normalizing raw events into scheduling and frame events
//! - Defining the report schema

pub mod embedded;
pub mod normalize;
pub mod schema;
pub mod source;
pub mod structured;

// Re-export main types
pub use embedded::EmbeddedScriptSource;
pub use normalize::{DropCounts, DropReason, EventNormalizer, NormalizedEvent, NormalizedTrace};
pub use schema::{
    AnalysisReport, CpuLoadSample, FrameEvent, FrameStats, JankResult, LoadPoint, ReportDocument,
    SchedState, SchedulingEvent, StateBreakdown,
};
pub use source::{
    open_capture, CaptureFormat, EventOrigin, RawEvents, RawTraceEvent, TimeUnit, TraceSource,
};
pub use structured::StructuredTraceSource;
