//! Single-pass driver tying the classifier and both builders together.
use super::classify::{self, Boundary, LOG_FIELDS, METRIC_FIELDS};
use super::log_record::LogRecordDraft;
use super::metric::MetricDraft;
use super::rank::dedupe_and_rank;
use super::{LineError, MetricEvent};
use tracing::{debug, trace};

/// Which draft the current line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    Idle,
    /// Inside a metric's descriptor, before any data point.
    InMetric,
    /// Data-point attributes route to the metric draft.
    InDataPoint,
    /// Attributes and timestamps route to the log-record draft.
    InLogRecord,
}

impl ParserState {
    /// Transition on a section-start marker.
    pub fn on_boundary(self, boundary: Boundary) -> Self {
        match boundary {
            Boundary::Metric => ParserState::InMetric,
            Boundary::DataPoint => ParserState::InDataPoint,
            Boundary::LogRecord => ParserState::InLogRecord,
        }
    }

    /// Transition after a `Value:` line closes a data point.
    pub fn on_value(self) -> Self {
        match self {
            ParserState::InDataPoint => ParserState::InMetric,
            other => other,
        }
    }

    /// Transition after a log record is finalized.
    pub fn on_log_finalized(self) -> Self {
        ParserState::Idle
    }
}

/// Incremental extractor. Feed lines in order, then call [`Extractor::finish`].
#[derive(Debug, Default)]
pub struct Extractor {
    state: ParserState,
    metric: MetricDraft,
    log: LogRecordDraft,
    metric_events: Vec<MetricEvent>,
    log_events: Vec<MetricEvent>,
    skipped: usize,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Lines rejected so far.
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    /// Process one line. Lines that fail to parse are skipped without
    /// touching any draft.
    pub fn feed(&mut self, line: &str) {
        if let Err(e) = self.step(line) {
            self.skipped += 1;
            trace!(error = %e, line, "skipping collector log line");
        }
    }

    fn step(&mut self, line: &str) -> Result<(), LineError> {
        let c = classify::classify(line);

        // Parse everything fallible up front so a bad line leaves no trace.
        let state = c
            .boundary
            .map_or(self.state, |b| self.state.on_boundary(b));
        let metric_fields = if state == ParserState::InDataPoint && c.is_attribute {
            Some(classify::extract_fields(METRIC_FIELDS.as_slice(), line)?)
        } else {
            None
        };
        let log_fields = if state == ParserState::InLogRecord && c.is_attribute {
            Some(classify::extract_fields(LOG_FIELDS.as_slice(), line)?)
        } else {
            None
        };
        let value = c
            .value
            .map(|raw| {
                raw.parse::<i64>().map_err(|_| LineError::BadValue {
                    raw: raw.to_string(),
                })
            })
            .transpose()?;

        if let Some(boundary) = c.boundary {
            self.enter(boundary);
        }
        if let Some(name) = c.name {
            self.metric.set_name(name);
        }
        if let Some(description) = c.description {
            self.metric.set_description(description);
        }
        if let Some(fields) = metric_fields {
            self.metric.apply_attributes(fields);
        }
        if let Some(ts) = c.timestamp {
            if self.state == ParserState::InLogRecord {
                if !ts.observed {
                    self.log.set_timestamp(ts.value);
                }
            } else {
                self.metric.set_timestamp(ts.value);
            }
        }
        if let Some(fields) = log_fields {
            self.log.apply_attributes(fields);
        }

        if self.state == ParserState::InLogRecord {
            if let Some(events) = self.log.try_finalize() {
                self.log_events.extend(events);
                self.log = LogRecordDraft::new();
                self.state = self.state.on_log_finalized();
            }
        }

        if let Some(value) = value {
            if let Some(event) = self.metric.finish_value(value) {
                self.metric_events.push(event);
            }
            self.state = self.state.on_value();
        }

        Ok(())
    }

    fn enter(&mut self, boundary: Boundary) {
        match boundary {
            Boundary::Metric => self.metric = MetricDraft::new(),
            Boundary::DataPoint => self.metric.begin_data_point(),
            Boundary::LogRecord => {
                if self.state == ParserState::InLogRecord {
                    self.flush_tool_call();
                }
                self.log = LogRecordDraft::new();
            }
        }
        self.state = self.state.on_boundary(boundary);
    }

    fn flush_tool_call(&mut self) {
        if let Some(event) = self.log.tool_call_event() {
            self.log_events.push(event);
        }
    }

    /// Flush a trailing tool call, then dedupe, rank and truncate.
    ///
    /// A trailing api-response record is not flushed here.
    pub fn finish(mut self, limit: usize) -> Vec<MetricEvent> {
        if self.state == ParserState::InLogRecord {
            self.flush_tool_call();
        }
        debug!(
            metric_events = self.metric_events.len(),
            log_events = self.log_events.len(),
            skipped = self.skipped,
            "collector log scanned"
        );
        let mut all = self.metric_events;
        all.extend(self.log_events);
        dedupe_and_rank(all, limit)
    }
}

/// Extract events from the full text of a collector log.
pub fn extract(text: &str, limit: usize) -> Vec<MetricEvent> {
    let mut extractor = Extractor::new();
    for line in text.lines() {
        extractor.feed(line);
    }
    extractor.finish(limit)
}
