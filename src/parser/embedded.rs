//! Embedded-script captures (systrace HTML and Trace Event Format JSON).
//!
//! The event data sits in a document as an array literal after a
//! `traceEvents` marker:
//!
//! ```text
//! <script>var traceEvents = [{"cat": "gfx", "name": "Frame", "ts": 0, "dur": 9000}];</script>
//! {"traceEvents": [{"cat": "load", "ts": 0, "dur": 5000}]}
//! ```
//!
//! The literal is decoded as JSON and nothing else. Anything that is not an
//! array of objects (script expressions, constructors, trailing commas) is a
//! malformed capture.

use super::source::{
    json_f64, CaptureFormat, EventOrigin, RawEvents, RawTraceEvent, TimeUnit, TraceSource,
};
use crate::utils::config::TRACE_EVENTS_MARKER;
use crate::utils::error::CaptureError;
use log::{debug, info};
use serde_json::{Map, Value};
use std::path::Path;

/// Source for documents carrying an embedded `traceEvents` literal
#[derive(Debug, Clone)]
pub struct EmbeddedScriptSource {
    document: String,
}

impl EmbeddedScriptSource {
    /// Wrap an in-memory document
    pub fn from_document(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }

    /// Read a capture document from disk
    pub fn from_path(path: &Path) -> Result<Self, CaptureError> {
        let bytes = std::fs::read(path).map_err(|e| {
            CaptureError::CaptureUnreadable(format!("cannot read {}: {}", path.display(), e))
        })?;

        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Self::from_document(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

impl TraceSource for EmbeddedScriptSource {
    fn format(&self) -> CaptureFormat {
        CaptureFormat::Embedded
    }

    fn time_unit(&self) -> TimeUnit {
        TimeUnit::Microseconds
    }

    fn events(self: Box<Self>) -> Result<RawEvents, CaptureError> {
        let literal = locate_literal(&self.document)?;
        let objects = decode_literal(literal)?;

        info!("Decoded {} embedded trace events", objects.len());
        Ok(Box::new(objects.into_iter().map(to_raw_event)))
    }
}

/// Find the start of the event array literal
///
/// **Private** - returns the document suffix beginning at `[`
fn locate_literal(document: &str) -> Result<&str, CaptureError> {
    let mut search_from = 0;

    while let Some(found) = document[search_from..].find(TRACE_EVENTS_MARKER) {
        let after_marker = search_from + found + TRACE_EVENTS_MARKER.len();

        if let Some(offset) = literal_offset(&document[after_marker..]) {
            debug!("Found {} literal at byte {}", TRACE_EVENTS_MARKER, after_marker + offset);
            return Ok(&document[after_marker + offset..]);
        }

        search_from = after_marker;
    }

    Err(CaptureError::MalformedCapture(format!(
        "no `{}` data region found",
        TRACE_EVENTS_MARKER
    )))
}

/// Offset of `[` in `<quote>? <ws> (= | :) <ws> [`, if the text has that shape
fn literal_offset(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices().peekable();

    // Closing quote of a JSON key
    if let Some((_, '"' | '\'')) = chars.peek() {
        chars.next();
    }

    let mut seen_assign = false;
    for (idx, ch) in chars {
        match ch {
            c if c.is_whitespace() => continue,
            '=' | ':' if !seen_assign => seen_assign = true,
            '[' if seen_assign => return Some(idx),
            _ => return None,
        }
    }
    None
}

/// Decode exactly one JSON array of objects from the start of `text`
///
/// Text after the closing bracket (`;</script>` and so on) is ignored.
fn decode_literal(text: &str) -> Result<Vec<Map<String, Value>>, CaptureError> {
    let mut stream =
        serde_json::Deserializer::from_str(text).into_iter::<Vec<Map<String, Value>>>();

    match stream.next() {
        Some(Ok(objects)) => {
            debug!("Event literal spans {} bytes", stream.byte_offset());
            Ok(objects)
        }
        Some(Err(e)) => Err(CaptureError::MalformedCapture(format!(
            "`{}` is not a literal array of objects: {}",
            TRACE_EVENTS_MARKER, e
        ))),
        None => Err(CaptureError::MalformedCapture(format!(
            "`{}` literal is empty",
            TRACE_EVENTS_MARKER
        ))),
    }
}

/// Split the well-known fields out of a decoded object
fn to_raw_event(mut object: Map<String, Value>) -> RawTraceEvent {
    let timestamp = object.remove("ts").as_ref().and_then(json_f64);
    let duration = object.remove("dur").as_ref().and_then(json_f64);
    let category = take_string(&mut object, "cat");
    let name = take_string(&mut object, "name");

    RawTraceEvent {
        timestamp,
        duration,
        category,
        name,
        extra: object,
        origin: EventOrigin::Document,
    }
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> String {
    match object.remove(key) {
        Some(Value::String(s)) => s,
        Some(other) => {
            // Keep the value visible to the normalizer instead of losing it
            object.insert(key.to_string(), other);
            String::new()
        }
        None => String::new(),
    }
}
