//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage at which a capture-level failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Opening the capture artifact
    Open,
    /// Locating and decoding events inside the capture
    SourceParsing,
    /// Producing a relation from a structured trace
    Query,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Open => "capture open",
            Stage::SourceParsing => "source parsing",
            Stage::Query => "trace query",
        };
        f.write_str(label)
    }
}

/// Errors that abort an analysis pass over one capture
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("malformed capture: {0}")]
    MalformedCapture(String),

    #[error("capture unreadable: {0}")]
    CaptureUnreadable(String),

    #[error("query for the {relation} relation failed: {source}")]
    QueryFailed {
        relation: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

impl CaptureError {
    /// Stage that produced this error
    pub fn stage(&self) -> Stage {
        match self {
            CaptureError::MalformedCapture(_) => Stage::SourceParsing,
            CaptureError::CaptureUnreadable(_) => Stage::Open,
            CaptureError::QueryFailed { .. } => Stage::Query,
        }
    }
}

/// A failed pass, tagged with the capture it was run on
#[derive(Error, Debug)]
#[error("analysis of {} failed during {}: {source}", .path.display(), .source.stage())]
pub struct AnalysisError {
    pub path: PathBuf,
    #[source]
    pub source: CaptureError,
}

impl AnalysisError {
    pub fn new(path: impl Into<PathBuf>, source: CaptureError) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    pub fn stage(&self) -> Stage {
        self.source.stage()
    }
}

/// Errors that can occur while loading analysis configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
