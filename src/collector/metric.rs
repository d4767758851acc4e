//! Accumulates one metric data point at a time.
use super::classify::{FieldValue, MetricField};
use super::{AttrValue, Attributes, EventKind, MetricEvent};

/// Substring identifying token-count metrics whose direction lives in the
/// description rather than in a `type` attribute.
const TOKEN_COUNT_METRIC: &str = "gemini.token.count";

/// A metric being read from consecutive lines.
///
/// The name and description persist across data points of one metric;
/// attributes are per data point.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MetricDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub timestamp: Option<String>,
    pub value: Option<i64>,
    pub attributes: Attributes,
}

impl MetricDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `NumberDataPoints #` line: each data point carries its own attributes.
    pub fn begin_data_point(&mut self) {
        if self.name.is_some() {
            self.attributes.clear();
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = Some(description.to_string());
    }

    pub fn set_timestamp(&mut self, timestamp: &str) {
        self.timestamp = Some(timestamp.to_string());
    }

    /// Apply the fields found on one data-point attribute line.
    pub fn apply_attributes(&mut self, fields: Vec<(MetricField, FieldValue)>) {
        for (field, value) in fields {
            let value = match value {
                FieldValue::Str(s) => AttrValue::Str(s),
                FieldValue::Int(n) => AttrValue::Int(n),
                FieldValue::Bool(b) => AttrValue::Str(b.to_string()),
            };
            self.attributes
                .insert(field.attribute_key().to_string(), value);
        }
        self.derive_token_type();
    }

    fn derive_token_type(&mut self) {
        let is_token_metric = self
            .name
            .as_deref()
            .is_some_and(|n| n.contains(TOKEN_COUNT_METRIC));
        if !is_token_metric {
            return;
        }
        let Some(desc) = self.description.as_deref().map(str::to_lowercase) else {
            return;
        };
        let direction = if desc.contains("input") {
            "input"
        } else if desc.contains("output") {
            "output"
        } else {
            return;
        };
        self.attributes.insert("type".into(), direction.into());
    }

    fn session_id(&self) -> Option<&str> {
        match self.attributes.get("sessionId") {
            Some(AttrValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// A `Value: <n>` line. Returns the finished event when the draft has a
    /// name, a session id and a timestamp.
    pub fn finish_value(&mut self, value: i64) -> Option<MetricEvent> {
        self.value = Some(value);
        let name = self.name.as_ref()?;
        let session_id = self.session_id()?;
        let timestamp = self.timestamp.as_ref()?;
        Some(MetricEvent {
            name: name.clone(),
            description: self.description.clone().unwrap_or_default(),
            session_id: session_id.to_string(),
            timestamp: timestamp.clone(),
            value,
            attributes: self.attributes.clone(),
            kind: EventKind::Counter,
        })
    }
}
