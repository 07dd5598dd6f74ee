//! Frametrace
//!
//! CPU load and jank analysis for device performance captures.
//!
//! A capture (systrace HTML with an embedded `traceEvents` literal, or a
//! trace-processor style database) is decoded by a [`parser::TraceSource`],
//! normalized into scheduling and frame events, analyzed per core and per
//! frame, and returned as an [`parser::AnalysisReport`].
//!
//! ```no_run
//! use frametrace::{analyze_capture, AnalysisConfig};
//!
//! let report = analyze_capture("trace.html", None, &AnalysisConfig::default())?;
//! println!("{}", report.summary());
//! # Ok::<(), frametrace::utils::AnalysisError>(())
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod commands;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod utils;

pub use parser::AnalysisReport;
pub use pipeline::{analyze_capture, analyze_source};
pub use utils::AnalysisConfig;
