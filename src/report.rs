//! The metrics report handed to dashboard and CLI consumers.
use crate::collector::{self, MetricEvent};
use crate::config::CollectorConfig;
use crate::discovery;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const NO_LOG_MESSAGE: &str = "No collector log found";

/// `{"metrics": [...], "total": n}`, or `{"metrics": [], "message": ...}`
/// when there is no log to read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub metrics: Vec<MetricEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MetricsReport {
    pub fn from_events(metrics: Vec<MetricEvent>) -> Self {
        Self {
            total: Some(metrics.len()),
            metrics,
            message: None,
        }
    }

    pub fn no_log() -> Self {
        Self {
            metrics: Vec::new(),
            total: None,
            message: Some(NO_LOG_MESSAGE.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum ReportError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Read { source, .. } => Some(source),
        }
    }
}

/// Read and extract one collector log file.
pub fn report_for_file(path: &Path, limit: usize) -> Result<MetricsReport, ReportError> {
    let bytes = std::fs::read(path).map_err(|e| ReportError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let events = collector::extract(&text, limit);

    let token_metrics = events.iter().filter(|m| m.name.contains("token")).count();
    let tool_metrics = events.iter().filter(|m| m.name.contains("tool")).count();
    info!(
        log = %path.display(),
        total = events.len(),
        token_metrics,
        tool_metrics,
        "extracted collector metrics"
    );

    Ok(MetricsReport::from_events(events))
}

/// Find the newest collector log and report on it. A missing log is not an
/// error.
pub fn build_report(config: &CollectorConfig) -> Result<MetricsReport, ReportError> {
    let Some(root) = config.tmp_root() else {
        return Ok(MetricsReport::no_log());
    };
    match discovery::latest_collector_log(&root, &config.log_relative_path) {
        Some(path) => report_for_file(&path, config.max_results),
        None => Ok(MetricsReport::no_log()),
    }
}
