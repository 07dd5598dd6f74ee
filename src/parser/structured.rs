//! Structured traces: relational captures in the trace processor schema.
//!
//! The capture is a SQLite database with (at least) these tables:
//!
//! ```text
//! sched(ts, dur, cpu, utid, end_state)
//! thread(utid, name, upid)
//! process(upid, name)
//! slice(ts, dur, category, name)
//! ```
//!
//! Timestamps and durations are nanoseconds. Two relations are produced: a
//! scheduling relation (slices with `dur > 0`) and a frame relation
//! (compositor `Frame` slices). Both are read completely before any event
//! is handed out.

use super::source::{
    CaptureFormat, EventOrigin, RawEvents, RawTraceEvent, TimeUnit, TraceSource,
};
use crate::utils::config::{
    COMPOSITOR_CATEGORY, FRAME_EVENT_NAME, SCHED_RELATION_CATEGORY, SCHED_RELATION_NAME,
};
use crate::utils::error::CaptureError;
use log::{debug, info};
use rusqlite::{Connection, OpenFlags};
use serde_json::{json, Map};
use std::path::Path;

const SCHED_QUERY: &str = "
    SELECT sched.ts, sched.dur, sched.cpu,
           process.name AS process_name,
           thread.name AS thread_name,
           sched.end_state AS state
    FROM sched
    LEFT JOIN thread ON sched.utid = thread.utid
    LEFT JOIN process ON thread.upid = process.upid
    WHERE sched.dur > 0
    ORDER BY sched.ts";

const FRAME_QUERY: &str = "
    SELECT ts, dur
    FROM slice
    WHERE category = ?1 AND name = ?2
    ORDER BY ts";

/// One row of the scheduling relation
#[derive(Debug, Clone, PartialEq)]
pub struct SchedRow {
    pub ts: f64,
    pub dur: f64,
    pub cpu: i64,
    pub process_name: Option<String>,
    pub thread_name: Option<String>,
    pub state: Option<String>,
}

/// One row of the frame relation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRow {
    pub ts: f64,
    pub dur: f64,
}

/// Source backed by an open trace database
pub struct StructuredTraceSource {
    conn: Connection,
}

impl StructuredTraceSource {
    /// Open a trace database read-only
    ///
    /// SQLite accepts an empty file as an empty database, so the header is
    /// checked before connecting.
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        if CaptureFormat::detect(path)? != CaptureFormat::Structured {
            return Err(CaptureError::CaptureUnreadable(format!(
                "{}: not a trace database (no SQLite header)",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            CaptureError::CaptureUnreadable(format!("cannot open {}: {}", path.display(), e))
        })?;

        Self::from_connection(conn).map_err(|e| match e {
            CaptureError::CaptureUnreadable(reason) => {
                CaptureError::CaptureUnreadable(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })
    }

    /// Use an already-open connection
    ///
    /// SQLite opens lazily, so probe the schema now to tell
    /// "not a trace database" apart from a failing query later.
    pub fn from_connection(conn: Connection) -> Result<Self, CaptureError> {
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| CaptureError::CaptureUnreadable(format!("not a trace database: {}", e)))?;

        Ok(Self { conn })
    }

    /// Query the scheduling relation
    pub fn query_sched(&self) -> Result<Vec<SchedRow>, CaptureError> {
        let query_failed = |source: rusqlite::Error| CaptureError::QueryFailed {
            relation: "scheduling",
            source,
        };

        let mut stmt = self.conn.prepare(SCHED_QUERY).map_err(query_failed)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SchedRow {
                    ts: row.get(0)?,
                    dur: row.get(1)?,
                    cpu: row.get(2)?,
                    process_name: row.get(3)?,
                    thread_name: row.get(4)?,
                    state: row.get(5)?,
                })
            })
            .map_err(query_failed)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_failed)?;

        debug!("Scheduling relation: {} rows", rows.len());
        Ok(rows)
    }

    /// Query the compositor frame relation
    pub fn query_frames(&self) -> Result<Vec<FrameRow>, CaptureError> {
        let query_failed = |source: rusqlite::Error| CaptureError::QueryFailed {
            relation: "frame",
            source,
        };

        let mut stmt = self.conn.prepare(FRAME_QUERY).map_err(query_failed)?;
        let rows = stmt
            .query_map([COMPOSITOR_CATEGORY, FRAME_EVENT_NAME], |row| {
                Ok(FrameRow {
                    ts: row.get(0)?,
                    dur: row.get(1)?,
                })
            })
            .map_err(query_failed)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_failed)?;

        debug!("Frame relation: {} rows", rows.len());
        Ok(rows)
    }
}

impl TraceSource for StructuredTraceSource {
    fn format(&self) -> CaptureFormat {
        CaptureFormat::Structured
    }

    fn time_unit(&self) -> TimeUnit {
        TimeUnit::Nanoseconds
    }

    fn events(self: Box<Self>) -> Result<RawEvents, CaptureError> {
        let sched = self.query_sched()?;
        let frames = self.query_frames()?;

        info!(
            "Queried {} scheduling slices and {} frames",
            sched.len(),
            frames.len()
        );

        let events = sched
            .into_iter()
            .map(sched_to_raw)
            .chain(frames.into_iter().map(frame_to_raw));

        Ok(Box::new(events))
    }
}

fn sched_to_raw(row: SchedRow) -> RawTraceEvent {
    let mut extra = Map::new();
    extra.insert("cpu".to_string(), json!(row.cpu));
    extra.insert(
        "process_name".to_string(),
        json!(row.process_name.unwrap_or_default()),
    );
    extra.insert(
        "thread_name".to_string(),
        json!(row.thread_name.unwrap_or_default()),
    );
    if let Some(state) = row.state {
        extra.insert("state".to_string(), json!(state));
    }

    RawTraceEvent {
        timestamp: Some(row.ts),
        duration: Some(row.dur),
        category: SCHED_RELATION_CATEGORY.to_string(),
        name: SCHED_RELATION_NAME.to_string(),
        extra,
        origin: EventOrigin::SchedulingRelation,
    }
}

fn frame_to_raw(row: FrameRow) -> RawTraceEvent {
    RawTraceEvent {
        timestamp: Some(row.ts),
        duration: Some(row.dur),
        category: COMPOSITOR_CATEGORY.to_string(),
        name: FRAME_EVENT_NAME.to_string(),
        extra: Map::new(),
        origin: EventOrigin::FrameRelation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "
        CREATE TABLE process (upid INTEGER PRIMARY KEY, name TEXT);
        CREATE TABLE thread (utid INTEGER PRIMARY KEY, name TEXT, upid INTEGER);
        CREATE TABLE sched (ts INTEGER, dur INTEGER, cpu INTEGER, utid INTEGER, end_state TEXT);
        CREATE TABLE slice (ts INTEGER, dur INTEGER, category TEXT, name TEXT);
    ";

    fn trace_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            "
            INSERT INTO process VALUES (1, 'com.example.app');
            INSERT INTO thread VALUES (10, 'RenderThread', 1);
            INSERT INTO thread VALUES (11, 'kworker/0:1', NULL);
            INSERT INTO sched VALUES (2000000, 1000000, 1, 10, 'S');
            INSERT INTO sched VALUES (1000000, 3000000, 0, 10, 'R');
            INSERT INTO sched VALUES (4000000, 0, 0, 10, 'R');
            INSERT INTO sched VALUES (5000000, 500000, 0, 11, NULL);
            INSERT INTO slice VALUES (0, 10000000, 'SurfaceFlinger', 'Frame');
            INSERT INTO slice VALUES (16000000, 20000000, 'SurfaceFlinger', 'Frame');
            INSERT INTO slice VALUES (1000, 5, 'SurfaceFlinger', 'onMessageReceived');
            INSERT INTO slice VALUES (2000, 5, 'gfx', 'Frame');
            ",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_sched_relation_filters_and_joins() {
        let source = StructuredTraceSource::from_connection(trace_db()).unwrap();
        let rows = source.query_sched().unwrap();

        // zero-duration slice dropped, ordered by ts
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].ts, 1_000_000.0);
        assert_eq!(rows[0].cpu, 0);
        assert_eq!(rows[0].process_name.as_deref(), Some("com.example.app"));
        assert_eq!(rows[0].thread_name.as_deref(), Some("RenderThread"));
        assert_eq!(rows[0].state.as_deref(), Some("R"));

        // thread without a process still yields a row
        assert_eq!(rows[2].thread_name.as_deref(), Some("kworker/0:1"));
        assert_eq!(rows[2].process_name, None);
        assert_eq!(rows[2].state, None);
    }

    #[test]
    fn test_frame_relation_only_compositor_frames() {
        let source = StructuredTraceSource::from_connection(trace_db()).unwrap();
        let rows = source.query_frames().unwrap();
        assert_eq!(
            rows,
            vec![
                FrameRow { ts: 0.0, dur: 10_000_000.0 },
                FrameRow { ts: 16_000_000.0, dur: 20_000_000.0 },
            ]
        );
    }

    #[test]
    fn test_events_carry_sched_fields_in_extra() {
        let source = Box::new(StructuredTraceSource::from_connection(trace_db()).unwrap());
        assert_eq!(source.time_unit(), TimeUnit::Nanoseconds);

        let events: Vec<RawTraceEvent> = source.events().unwrap().collect();
        assert_eq!(events.len(), 5);

        let first = &events[0];
        assert_eq!(first.origin, EventOrigin::SchedulingRelation);
        assert_eq!(first.category, SCHED_RELATION_CATEGORY);
        assert_eq!(first.extra["cpu"], 0);
        assert_eq!(first.extra["thread_name"], "RenderThread");
        assert_eq!(first.extra["state"], "R");

        let last = &events[4];
        assert_eq!(last.origin, EventOrigin::FrameRelation);
        assert_eq!(last.category, COMPOSITOR_CATEGORY);
        assert_eq!(last.name, FRAME_EVENT_NAME);
    }

    #[test]
    fn test_missing_slice_table_fails_frame_query() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE process (upid INTEGER PRIMARY KEY, name TEXT);
            CREATE TABLE thread (utid INTEGER PRIMARY KEY, name TEXT, upid INTEGER);
            CREATE TABLE sched (ts INTEGER, dur INTEGER, cpu INTEGER, utid INTEGER, end_state TEXT);
            ",
        )
        .unwrap();

        let source = Box::new(StructuredTraceSource::from_connection(conn).unwrap());
        match source.events() {
            Err(CaptureError::QueryFailed { relation, .. }) => assert_eq!(relation, "frame"),
            other => panic!("expected QueryFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_sched_table_fails_sched_query() {
        let conn = Connection::open_in_memory().unwrap();
        let source = StructuredTraceSource::from_connection(conn).unwrap();
        match source.query_sched() {
            Err(CaptureError::QueryFailed { relation, .. }) => assert_eq!(relation, "scheduling"),
            other => panic!("expected QueryFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_open_missing_file_is_unreadable() {
        let result = StructuredTraceSource::open(Path::new("/nonexistent/trace.db"));
        assert!(matches!(result, Err(CaptureError::CaptureUnreadable(_))));
    }

    #[test]
    fn test_open_empty_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        std::fs::write(&path, b"").unwrap();

        match StructuredTraceSource::open(&path) {
            Err(CaptureError::CaptureUnreadable(reason)) => {
                assert!(reason.contains("not a trace database"))
            }
            other => panic!("expected CaptureUnreadable, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_open_written_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        drop(conn);

        let source = StructuredTraceSource::open(&path).unwrap();
        assert!(source.query_sched().unwrap().is_empty());
        assert!(source.query_frames().unwrap().is_empty());
    }

    #[test]
    fn test_open_non_database_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.perfetto-trace");
        std::fs::write(&path, b"this is definitely not a sqlite database file, just text").unwrap();

        let result = StructuredTraceSource::open(&path);
        assert!(matches!(result, Err(CaptureError::CaptureUnreadable(_))));
    }
}
