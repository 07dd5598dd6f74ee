//! Capture sources and the raw event shape they produce.
//!
//! Each capture format gets its own `TraceSource`. Sources decode the
//! capture into `RawTraceEvent`s and report the time unit those events use,
//! so the normalizer never has to know which format it is looking at.

use super::embedded::EmbeddedScriptSource;
use super::structured::StructuredTraceSource;
use crate::utils::config::SQLITE_MAGIC;
use crate::utils::error::CaptureError;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Where a raw event came from inside its capture
///
/// Only sources set this; nothing in the event payload can change it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventOrigin {
    /// Decoded from a document's event literal, routed by category/name
    #[default]
    Document,
    /// Row of a structured trace's scheduling relation
    SchedulingRelation,
    /// Row of a structured trace's frame relation
    FrameRelation,
}

/// Untyped event as decoded from a capture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTraceEvent {
    /// Start time in the source's unit (None if absent or not numeric)
    pub timestamp: Option<f64>,

    /// Duration in the source's unit (None if absent or not numeric)
    pub duration: Option<f64>,

    pub category: String,
    pub name: String,

    /// Every other field the source carried
    pub extra: Map<String, Value>,

    pub origin: EventOrigin,
}

/// Unit of `RawTraceEvent` timestamps and durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// Convert a value in this unit to milliseconds
    pub fn to_millis(self, value: f64) -> f64 {
        match self {
            TimeUnit::Microseconds => value / 1_000.0,
            TimeUnit::Nanoseconds => value / 1_000_000.0,
        }
    }
}

/// Supported capture formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    /// Document with an embedded `traceEvents` literal (systrace HTML, JSON)
    Embedded,
    /// Relational trace database (trace processor schema)
    Structured,
}

impl CaptureFormat {
    /// Guess the format from the file's leading bytes
    pub fn detect(path: &Path) -> Result<Self, CaptureError> {
        let mut file = File::open(path).map_err(|e| {
            CaptureError::CaptureUnreadable(format!("cannot open {}: {}", path.display(), e))
        })?;

        let mut header = [0u8; 16];
        let mut filled = 0;
        while filled < header.len() {
            match file.read(&mut header[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(CaptureError::CaptureUnreadable(format!(
                        "cannot read {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        let format = if &header[..filled] == SQLITE_MAGIC {
            CaptureFormat::Structured
        } else {
            CaptureFormat::Embedded
        };

        debug!("Detected {} capture format for {}", format, path.display());
        Ok(format)
    }
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureFormat::Embedded => f.write_str("embedded"),
            CaptureFormat::Structured => f.write_str("structured"),
        }
    }
}

impl FromStr for CaptureFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "embedded" | "systrace" | "html" => Ok(CaptureFormat::Embedded),
            "structured" | "perfetto" | "sqlite" => Ok(CaptureFormat::Structured),
            other => Err(format!("unknown capture format: {}", other)),
        }
    }
}

/// Single-pass stream of raw events
pub type RawEvents = Box<dyn Iterator<Item = RawTraceEvent>>;

/// A decoder for one capture format
pub trait TraceSource {
    /// Format this source decodes
    fn format(&self) -> CaptureFormat;

    /// Unit of the timestamps and durations in emitted events
    fn time_unit(&self) -> TimeUnit;

    /// Decode the capture. Consumes the source: a capture is read once.
    ///
    /// Capture-level failures surface here, before any event is yielded.
    fn events(self: Box<Self>) -> Result<RawEvents, CaptureError>;
}

/// Open a capture file with the source for its format
///
/// **Public** - `format` overrides detection when given
pub fn open_capture(
    path: impl AsRef<Path>,
    format: Option<CaptureFormat>,
) -> Result<Box<dyn TraceSource>, CaptureError> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => CaptureFormat::detect(path)?,
    };

    match format {
        CaptureFormat::Embedded => Ok(Box::new(EmbeddedScriptSource::from_path(path)?)),
        CaptureFormat::Structured => Ok(Box::new(StructuredTraceSource::open(path)?)),
    }
}

/// Read a number that may be encoded as a JSON number or numeric string
pub(crate) fn json_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_time_unit_conversion() {
        assert_eq!(TimeUnit::Microseconds.to_millis(16_600.0), 16.6);
        assert_eq!(TimeUnit::Nanoseconds.to_millis(5_000_000.0), 5.0);
    }

    #[test]
    fn test_json_f64_accepts_numeric_strings() {
        assert_eq!(json_f64(&json!(12)), Some(12.0));
        assert_eq!(json_f64(&json!("1200.5")), Some(1200.5));
        assert_eq!(json_f64(&json!("abc")), None);
        assert_eq!(json_f64(&json!(null)), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("perfetto".parse::<CaptureFormat>(), Ok(CaptureFormat::Structured));
        assert_eq!("HTML".parse::<CaptureFormat>(), Ok(CaptureFormat::Embedded));
        assert!("pcap".parse::<CaptureFormat>().is_err());
    }

    #[test]
    fn test_detect_html_document() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "<html><script>var traceEvents = [];</script></html>").unwrap();
        assert_eq!(
            CaptureFormat::detect(file.path()).unwrap(),
            CaptureFormat::Embedded
        );
    }

    #[test]
    fn test_detect_sqlite_header() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SQLITE_MAGIC).unwrap();
        file.write_all(&[0u8; 32]).unwrap();
        assert_eq!(
            CaptureFormat::detect(file.path()).unwrap(),
            CaptureFormat::Structured
        );
    }

    #[test]
    fn test_detect_missing_file() {
        let result = CaptureFormat::detect(Path::new("/nonexistent/trace.html"));
        assert!(matches!(result, Err(CaptureError::CaptureUnreadable(_))));
    }
}
