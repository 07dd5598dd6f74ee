//! Configuration and constants for trace analysis.

use super::error::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Render budget for a 60 Hz refresh target
pub const DEFAULT_FRAME_BUDGET_MS: f64 = 16.6;

// Marker preceding the event literal in embedded-script captures.
// Matches both `var traceEvents = [...]` and `{"traceEvents": [...]}`.
pub const TRACE_EVENTS_MARKER: &str = "traceEvents";

// Category routing for document events. Structured relations are routed by origin.
pub const SCHED_CATEGORY: &str = "load";
pub const FRAME_CATEGORIES: &[&str] = &["gfx", "view", "SurfaceFlinger"];
pub const FRAME_EVENT_NAME: &str = "Frame";

/// Category/name assigned to rows of the scheduling relation
pub const SCHED_RELATION_CATEGORY: &str = "sched";
pub const SCHED_RELATION_NAME: &str = "sched_slice";

/// Compositor slices that mark one rendered frame in structured traces
pub const COMPOSITOR_CATEGORY: &str = "SurfaceFlinger";

/// First 16 bytes of every SQLite database file
pub const SQLITE_MAGIC: &[u8] = b"SQLite format 3\0";

/// Per-call analysis settings.
///
/// Passed explicitly into every analysis pass; nothing here is process-wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Frames rendering longer than this are jank
    pub frame_budget_ms: f64,

    /// Capture length in seconds. Informational only.
    pub capture_duration_hint: Option<u32>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
            capture_duration_hint: None,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame_budget(mut self, budget_ms: f64) -> Self {
        self.frame_budget_ms = budget_ms;
        self
    }

    pub fn with_duration_hint(mut self, seconds: Option<u32>) -> Self {
        self.capture_duration_hint = seconds;
        self
    }

    /// Parse a TOML config document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading analysis config from: {}", path.display());

        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_toml_str(&text)
    }

    /// Reject budgets that would make every comparison meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.frame_budget_ms.is_finite() || self.frame_budget_ms <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "frame_budget_ms must be a positive number, got {}",
                self.frame_budget_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget_is_60hz() {
        let config = AnalysisConfig::default();
        assert_eq!(config.frame_budget_ms, 16.6);
        assert!(config.capture_duration_hint.is_none());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = AnalysisConfig::from_toml_str("frame_budget_ms = 8.3\n").unwrap();
        assert_eq!(config.frame_budget_ms, 8.3);
        assert_eq!(config.capture_duration_hint, None);
    }

    #[test]
    fn test_from_toml_full() {
        let text = "frame_budget_ms = 11.1\ncapture_duration_hint = 10\n";
        let config = AnalysisConfig::from_toml_str(text).unwrap();
        assert_eq!(config.capture_duration_hint, Some(10));
    }

    #[test]
    fn test_from_toml_rejects_zero_budget() {
        let result = AnalysisConfig::from_toml_str("frame_budget_ms = 0.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_toml_rejects_bad_syntax() {
        let result = AnalysisConfig::from_toml_str("frame_budget_ms = \n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = AnalysisConfig::load("/nonexistent/frametrace.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
