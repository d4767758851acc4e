//! Lexical classification of collector log lines.
//!
//! Nothing here knows about parser state. [`classify`] reports every
//! structural marker a line carries, and the field tables describe which
//! attributes each section cares about. The pipeline decides which of those
//! observations apply.
use super::LineError;
use regex::Regex;
use std::sync::LazyLock;

/// Section-start markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Metric,
    DataPoint,
    LogRecord,
}

/// A `Timestamp: ... UTC` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampLine<'a> {
    pub value: &'a str,
    /// `ObservedTimestamp:` rather than `Timestamp:`. Log records ignore these.
    pub observed: bool,
}

/// Everything [`classify`] recognized on one line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classified<'a> {
    pub boundary: Option<Boundary>,
    /// Contains the `-> ` attribute marker.
    pub is_attribute: bool,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub timestamp: Option<TimestampLine<'a>>,
    /// Digits of a trailing `Value: <n>`, not yet parsed.
    pub value: Option<&'a str>,
}

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-> Name: (.+)$").unwrap());
static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-> Description: (.+)$").unwrap());
static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Timestamp: (.+) UTC$").unwrap());
static VALUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Value: (\d+)$").unwrap());

/// Classify one line of collector output.
pub fn classify(line: &str) -> Classified<'_> {
    let boundary = if line.contains("Metric #") {
        Some(Boundary::Metric)
    } else if line.contains("LogRecord #") {
        Some(Boundary::LogRecord)
    } else if line.contains("NumberDataPoints #") {
        Some(Boundary::DataPoint)
    } else {
        None
    };

    let capture = move |re: &Regex| {
        re.captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    };

    let timestamp = if line.contains("Timestamp:") && !line.contains("StartTimestamp") {
        capture(&TIMESTAMP_RE).map(|value| TimestampLine {
            value,
            observed: line.contains("ObservedTimestamp"),
        })
    } else {
        None
    };

    Classified {
        boundary,
        is_attribute: line.contains("-> "),
        name: capture(&NAME_RE).map(str::trim),
        description: capture(&DESCRIPTION_RE).map(str::trim),
        timestamp,
        value: capture(&VALUE_RE),
    }
}

/// The debug exporter's typed value wrappers: `Str(..)`, `Int(..)`, `Bool(..)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Int,
    Bool,
}

impl ValueKind {
    fn tag(self) -> &'static str {
        match self {
            ValueKind::Str => "Str",
            ValueKind::Int => "Int",
            ValueKind::Bool => "Bool",
        }
    }
}

/// A parsed attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

/// Attributes read from a metric's data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    SessionId,
    Model,
    Type,
    Operation,
    Lines,
    Mimetype,
    Extension,
}

impl MetricField {
    /// Key under which the field lands in [`super::MetricEvent::attributes`].
    pub fn attribute_key(self) -> &'static str {
        match self {
            MetricField::SessionId => "sessionId",
            MetricField::Model => "model",
            MetricField::Type => "type",
            MetricField::Operation => "operation",
            MetricField::Lines => "lines",
            MetricField::Mimetype => "mimetype",
            MetricField::Extension => "extension",
        }
    }
}

/// Attributes read from a structured log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogField {
    EventName,
    SessionId,
    Model,
    FunctionName,
    Success,
    DurationMs,
    InputTokens,
    OutputTokens,
    CachedTokens,
    ThoughtsTokens,
    TotalTokens,
}

/// One row of a field table: `<key>: <Kind>(<raw>)` maps to `field`.
pub struct FieldRule<F> {
    pub key: &'static str,
    pub kind: ValueKind,
    pub field: F,
    pattern: Regex,
}

impl<F: Copy> FieldRule<F> {
    fn new(key: &'static str, kind: ValueKind, field: F) -> Self {
        let pattern = Regex::new(&format!(
            r"{}: {}\(([^)]+)\)",
            regex::escape(key),
            kind.tag()
        ))
        .unwrap();
        Self {
            key,
            kind,
            field,
            pattern,
        }
    }

    /// Match this rule against `line`, parsing the captured text.
    ///
    /// `Ok(None)` means the line does not carry this key.
    fn extract(&self, line: &str) -> Result<Option<FieldValue>, LineError> {
        let Some(raw) = self
            .pattern
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
        else {
            return Ok(None);
        };
        let value = match self.kind {
            ValueKind::Str => FieldValue::Str(raw.to_string()),
            ValueKind::Int => FieldValue::Int(raw.trim().parse().map_err(|_| {
                LineError::BadInt {
                    key: self.key.to_string(),
                    raw: raw.to_string(),
                }
            })?),
            ValueKind::Bool => match raw.trim() {
                "true" => FieldValue::Bool(true),
                "false" => FieldValue::Bool(false),
                _ => {
                    return Err(LineError::BadBool {
                        key: self.key.to_string(),
                        raw: raw.to_string(),
                    })
                }
            },
        };
        Ok(Some(value))
    }
}

pub static METRIC_FIELDS: LazyLock<Vec<FieldRule<MetricField>>> = LazyLock::new(|| {
    vec![
        FieldRule::new("session.id", ValueKind::Str, MetricField::SessionId),
        FieldRule::new("model", ValueKind::Str, MetricField::Model),
        FieldRule::new("type", ValueKind::Str, MetricField::Type),
        FieldRule::new("operation", ValueKind::Str, MetricField::Operation),
        FieldRule::new("lines", ValueKind::Int, MetricField::Lines),
        FieldRule::new("mimetype", ValueKind::Str, MetricField::Mimetype),
        FieldRule::new("extension", ValueKind::Str, MetricField::Extension),
    ]
});

pub static LOG_FIELDS: LazyLock<Vec<FieldRule<LogField>>> = LazyLock::new(|| {
    vec![
        FieldRule::new("event.name", ValueKind::Str, LogField::EventName),
        FieldRule::new("session.id", ValueKind::Str, LogField::SessionId),
        FieldRule::new("model", ValueKind::Str, LogField::Model),
        FieldRule::new("function_name", ValueKind::Str, LogField::FunctionName),
        FieldRule::new("success", ValueKind::Bool, LogField::Success),
        FieldRule::new("duration_ms", ValueKind::Int, LogField::DurationMs),
        FieldRule::new("input_token_count", ValueKind::Int, LogField::InputTokens),
        FieldRule::new("output_token_count", ValueKind::Int, LogField::OutputTokens),
        FieldRule::new(
            "cached_content_token_count",
            ValueKind::Int,
            LogField::CachedTokens,
        ),
        FieldRule::new("thoughts_token_count", ValueKind::Int, LogField::ThoughtsTokens),
        FieldRule::new("total_token_count", ValueKind::Int, LogField::TotalTokens),
    ]
});

/// Run every rule in `table` against `line`.
///
/// Matching is substring based, so one line can satisfy several rules
/// (`mimetype: Str(..)` also matches `type`). Any rule whose captured text
/// fails to parse rejects the whole line.
pub fn extract_fields<F: Copy>(
    table: &[FieldRule<F>],
    line: &str,
) -> Result<Vec<(F, FieldValue)>, LineError> {
    let mut out = Vec::new();
    for rule in table {
        if let Some(value) = rule.extract(line)? {
            out.push((rule.field, value));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_boundaries() {
        assert_eq!(classify("Metric #3").boundary, Some(Boundary::Metric));
        assert_eq!(
            classify("NumberDataPoints #0").boundary,
            Some(Boundary::DataPoint)
        );
        assert_eq!(classify("LogRecord #12").boundary, Some(Boundary::LogRecord));
        assert_eq!(classify("ResourceMetrics #0").boundary, None);
        assert_eq!(classify("ScopeLogs #0").boundary, None);
    }

    #[test]
    fn captures_name_and_description() {
        let c = classify("     -> Name: gemini_cli.session.count  ");
        assert_eq!(c.name, Some("gemini_cli.session.count"));
        assert!(c.is_attribute);

        let c = classify("     -> Description: Count of CLI sessions started.");
        assert_eq!(c.description, Some("Count of CLI sessions started."));
    }

    #[test]
    fn timestamp_variants() {
        let c = classify("Timestamp: 2025-07-20 14:03:11.123 +0000 UTC");
        let ts = c.timestamp.unwrap();
        assert_eq!(ts.value, "2025-07-20 14:03:11.123 +0000");
        assert!(!ts.observed);

        let c = classify("ObservedTimestamp: 2025-07-20 14:03:11.123 +0000 UTC");
        assert!(c.timestamp.unwrap().observed);

        let c = classify("StartTimestamp: 2025-07-20 14:00:00 +0000 UTC");
        assert!(c.timestamp.is_none());

        let c = classify("Timestamp: 1970-01-01 00:00:00 +0000");
        assert!(c.timestamp.is_none(), "no trailing UTC");
    }

    #[test]
    fn value_line_requires_trailing_digits() {
        assert_eq!(classify("Value: 17").value, Some("17"));
        assert_eq!(classify("Value: 1.5").value, None);
        assert_eq!(classify("Value: 17 apples").value, None);
    }

    #[test]
    fn metric_fields_extracted_from_attribute_line() {
        let fields =
            extract_fields(METRIC_FIELDS.as_slice(), "     -> session.id: Str(abc-123)").unwrap();
        assert_eq!(
            fields,
            vec![(MetricField::SessionId, FieldValue::Str("abc-123".into()))]
        );

        let fields = extract_fields(METRIC_FIELDS.as_slice(), "     -> lines: Int(42)").unwrap();
        assert_eq!(fields, vec![(MetricField::Lines, FieldValue::Int(42))]);
    }

    #[test]
    fn overlapping_patterns_all_reported() {
        let fields =
            extract_fields(METRIC_FIELDS.as_slice(), "     -> mimetype: Str(text/plain)").unwrap();
        assert!(fields.contains(&(MetricField::Type, FieldValue::Str("text/plain".into()))));
        assert!(fields.contains(&(MetricField::Mimetype, FieldValue::Str("text/plain".into()))));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let fields = extract_fields(METRIC_FIELDS.as_slice(), "     -> color: Str(blue)").unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn bad_int_rejects_line() {
        let err = extract_fields(METRIC_FIELDS.as_slice(), "     -> lines: Int(many)").unwrap_err();
        assert_eq!(
            err,
            LineError::BadInt {
                key: "lines".into(),
                raw: "many".into()
            }
        );
    }

    #[test]
    fn log_fields_parse_bools_and_token_counts() {
        let fields = extract_fields(LOG_FIELDS.as_slice(), "     -> success: Bool(true)").unwrap();
        assert_eq!(fields, vec![(LogField::Success, FieldValue::Bool(true))]);

        let fields =
            extract_fields(LOG_FIELDS.as_slice(), "     -> cached_content_token_count: Int(7)").unwrap();
        assert_eq!(fields, vec![(LogField::CachedTokens, FieldValue::Int(7))]);

        assert!(extract_fields(LOG_FIELDS.as_slice(), "     -> success: Bool(maybe)").is_err());
    }

    #[test]
    fn token_count_keys_do_not_collide() {
        let fields =
            extract_fields(LOG_FIELDS.as_slice(), "     -> total_token_count: Int(99)").unwrap();
        assert_eq!(fields, vec![(LogField::TotalTokens, FieldValue::Int(99))]);
    }
}
