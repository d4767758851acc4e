//! Reconstructs Gemini CLI telemetry from the OpenTelemetry collector's
//! debug-exporter dump.
//!
//! The debug exporter writes metrics and log records as indented text blocks:
//!
//! ```text
//! Metric #0
//! Descriptor:
//!      -> Name: gemini_cli.tool.call.count
//!      -> Description: Counts tool calls
//! NumberDataPoints #0
//! Data point attributes:
//!      -> session.id: Str(5f1c...)
//!      -> function_name: Str(read_file)
//! StartTimestamp: 2025-07-20 14:03:00.000 +0000 UTC
//! Timestamp: 2025-07-20 14:03:11.123 +0000 UTC
//! Value: 3
//! ```
//!
//! [`extract`] walks those lines once and produces a deduplicated,
//! most-recent-first list of [`MetricEvent`]s.
pub mod classify;
pub mod log_record;
pub mod metric;
pub mod pipeline;
pub mod rank;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub use pipeline::{extract, ParserState};

/// Upper bound on the number of events returned to consumers.
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// A single attribute value attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Int(n)
    }
}

/// Event attributes. Ordered so equality and hashing are structural.
pub type Attributes = BTreeMap<String, AttrValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Counter,
    Gauge,
}

/// One observed measurement, either read from a metric data point or
/// derived from a structured log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricEvent {
    pub name: String,
    pub description: String,
    pub session_id: String,
    /// Timestamp text as captured from the log, without the trailing ` UTC`.
    pub timestamp: String,
    pub value: i64,
    pub attributes: Attributes,
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl MetricEvent {
    /// Parsed form of [`MetricEvent::timestamp`], if it is in a known format.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Parse a collector timestamp such as `2025-07-20 14:03:11.123456 +0000`.
///
/// Also accepts the same layout without an offset (taken as UTC) and RFC 3339.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f %z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A line that could not be interpreted. The pipeline skips such lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    BadInt { key: String, raw: String },
    BadBool { key: String, raw: String },
    BadValue { raw: String },
}

impl std::fmt::Display for LineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineError::BadInt { key, raw } => write!(f, "{key}: not an integer: {raw}"),
            LineError::BadBool { key, raw } => write!(f, "{key}: not a boolean: {raw}"),
            LineError::BadValue { raw } => write!(f, "value out of range: {raw}"),
        }
    }
}

impl std::error::Error for LineError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_collector_timestamp_with_offset() {
        let ts = parse_timestamp("2025-07-20 14:03:11.123456789 +0000").unwrap();
        assert_eq!(ts.year(), 2025);
        assert_eq!(ts.hour(), 14);
        assert_eq!(ts.nanosecond(), 123_456_789);
    }

    #[test]
    fn parses_timestamp_with_non_utc_offset() {
        let ts = parse_timestamp("2025-07-20 16:03:11 +0200").unwrap();
        assert_eq!(ts.hour(), 14);
    }

    #[test]
    fn parses_naive_and_rfc3339_timestamps() {
        assert!(parse_timestamp("2025-07-20 14:03:11").is_some());
        assert!(parse_timestamp("2025-07-20T14:03:11Z").is_some());
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert!(parse_timestamp("yesterday-ish").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn event_serializes_with_dashboard_keys() {
        let mut attributes = Attributes::new();
        attributes.insert("type".into(), "input".into());
        attributes.insert("duration_ms".into(), 12.into());
        let event = MetricEvent {
            name: "gemini_cli.token.usage".into(),
            description: String::new(),
            session_id: "abc".into(),
            timestamp: "2025-07-20 14:03:11 +0000".into(),
            value: 42,
            attributes,
            kind: EventKind::Counter,
        };
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["sessionId"], "abc");
        assert_eq!(v["type"], "counter");
        assert_eq!(v["attributes"]["type"], "input");
        assert_eq!(v["attributes"]["duration_ms"], 12);
        assert_eq!(v["value"], 42);
    }
}
