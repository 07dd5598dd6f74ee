//! Aggregation of analyzer outputs into the final report.
//!
//! This is the only interface consumed by renderers and printers:
//! - `AnalysisReport` assembly
//! - Deterministic text summary

pub mod report;

// Re-export main functions
pub use report::{build_report, summarize};
