//! Turns structured log records into derived metric events.
//!
//! Gemini CLI logs one record per API response and per tool call. Neither
//! carries a metric block of its own, so token usage, response time and tool
//! usage are reconstructed from the record's attributes.
use super::classify::{FieldValue, LogField};
use super::{AttrValue, Attributes, EventKind, MetricEvent};
use tracing::trace;

pub const API_RESPONSE_EVENT: &str = "gemini_cli.api_response";
pub const TOOL_CALL_EVENT: &str = "gemini_cli.tool_call";

pub const TOKEN_USAGE_METRIC: &str = "gemini_cli.token.usage";
pub const RESPONSE_TIME_METRIC: &str = "gemini_cli.api.response_time";
pub const TOOL_USAGE_METRIC: &str = "gemini_cli.tool.usage";

/// A log record being read from consecutive lines.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogRecordDraft {
    pub is_api_response: bool,
    pub is_tool_call: bool,
    pub session_id: Option<String>,
    pub timestamp: Option<String>,
    pub model: Option<String>,
    pub function_name: Option<String>,
    pub success: Option<bool>,
    /// Tool execution time.
    pub duration_ms: Option<i64>,
    /// API round-trip time.
    pub api_duration_ms: Option<i64>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub cached_tokens: Option<i64>,
    pub thoughts_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
}

impl LogRecordDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_timestamp(&mut self, timestamp: &str) {
        self.timestamp = Some(timestamp.to_string());
    }

    /// Apply the fields found on one attribute line, in table order.
    ///
    /// `duration_ms` is routed by the record kind known at this point, so a
    /// duration seen before `event.name` is dropped.
    pub fn apply_attributes(&mut self, fields: Vec<(LogField, FieldValue)>) {
        for (field, value) in fields {
            match (field, value) {
                (LogField::EventName, FieldValue::Str(name)) => {
                    if name.contains(API_RESPONSE_EVENT) {
                        self.is_api_response = true;
                    }
                    if name.contains(TOOL_CALL_EVENT) {
                        self.is_tool_call = true;
                    }
                }
                (LogField::SessionId, FieldValue::Str(s)) => self.session_id = Some(s),
                (LogField::Model, FieldValue::Str(s)) => self.model = Some(s),
                (LogField::FunctionName, FieldValue::Str(s)) => self.function_name = Some(s),
                (LogField::Success, FieldValue::Bool(b)) => self.success = Some(b),
                (LogField::DurationMs, FieldValue::Int(ms)) => {
                    if self.is_api_response {
                        self.api_duration_ms = Some(ms);
                    } else if self.is_tool_call {
                        self.duration_ms = Some(ms);
                    }
                }
                (LogField::InputTokens, FieldValue::Int(n)) => self.input_tokens = Some(n),
                (LogField::OutputTokens, FieldValue::Int(n)) => self.output_tokens = Some(n),
                (LogField::CachedTokens, FieldValue::Int(n)) => self.cached_tokens = Some(n),
                (LogField::ThoughtsTokens, FieldValue::Int(n)) => self.thoughts_tokens = Some(n),
                (LogField::TotalTokens, FieldValue::Int(n)) => self.total_tokens = Some(n),
                _ => {}
            }
        }
    }

    /// Events for a complete api-response record, or `None` if the record is
    /// not an api response or still lacks a session id or timestamp.
    pub fn api_response_events(&self) -> Option<Vec<MetricEvent>> {
        if !self.is_api_response {
            return None;
        }
        let session_id = self.session_id.as_deref()?;
        let timestamp = self.timestamp.as_deref()?;

        let event = |name: &str,
                     description: &str,
                     value: i64,
                     attributes: Attributes,
                     kind: EventKind| MetricEvent {
            name: name.to_string(),
            description: description.to_string(),
            session_id: session_id.to_string(),
            timestamp: timestamp.to_string(),
            value,
            attributes,
            kind,
        };

        let tokens = [
            (self.input_tokens, "input", "Input tokens used in API call"),
            (self.output_tokens, "output", "Output tokens generated in API call"),
            (self.cached_tokens, "cached", "Cached tokens used in API call"),
            (self.thoughts_tokens, "thoughts", "Thoughts tokens used in API call"),
        ];

        let mut events = Vec::new();
        for (count, kind, description) in tokens {
            let Some(count) = count else { continue };
            let mut attributes = self.model_attributes();
            attributes.insert("type".into(), kind.into());
            events.push(event(
                TOKEN_USAGE_METRIC,
                description,
                count,
                attributes,
                EventKind::Counter,
            ));
        }

        if let Some(ms) = self.api_duration_ms {
            let mut attributes = self.model_attributes();
            attributes.insert("duration_ms".into(), AttrValue::Int(ms));
            events.push(event(
                RESPONSE_TIME_METRIC,
                "API response time in milliseconds",
                ms,
                attributes,
                EventKind::Gauge,
            ));
        }

        trace!(
            session_id,
            events = events.len(),
            total_tokens = ?self.total_tokens,
            "api response record complete"
        );
        Some(events)
    }

    /// The tool-usage event for a complete tool-call record, or `None` if the
    /// record is not a tool call or lacks a session id, timestamp or function.
    pub fn tool_call_event(&self) -> Option<MetricEvent> {
        if !self.is_tool_call {
            return None;
        }
        let session_id = self.session_id.as_deref()?;
        let timestamp = self.timestamp.as_deref()?;
        let function_name = self.function_name.as_deref()?;

        let mut attributes = Attributes::new();
        attributes.insert("operation".into(), function_name.into());
        let success = if self.success.unwrap_or(false) {
            "true"
        } else {
            "false"
        };
        attributes.insert("success".into(), success.into());
        attributes.insert(
            "duration_ms".into(),
            AttrValue::Int(self.duration_ms.unwrap_or(0)),
        );

        Some(MetricEvent {
            name: TOOL_USAGE_METRIC.to_string(),
            description: "Tool call executed".to_string(),
            session_id: session_id.to_string(),
            timestamp: timestamp.to_string(),
            value: 1,
            attributes,
            kind: EventKind::Counter,
        })
    }

    /// Check the finalization rules in order: api response first, then tool
    /// call. At most one applies.
    pub fn try_finalize(&self) -> Option<Vec<MetricEvent>> {
        self.api_response_events()
            .or_else(|| self.tool_call_event().map(|e| vec![e]))
    }

    fn model_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        if let Some(model) = &self.model {
            attributes.insert("model".into(), model.as_str().into());
        }
        attributes
    }
}
