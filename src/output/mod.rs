//! Output writers for analysis reports.
//!
//! This module handles writing reports to disk as versioned JSON documents
//! and reading them back for validation.

pub mod json;

// Re-export main functions
pub use json::{read_report, to_document, write_report};
