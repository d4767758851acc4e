use gemini_dash::config::CollectorConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct UiConfig {
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DashboardConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Base URL of the Jaeger query service.
    #[serde(default = "default_trace_backend_url")]
    pub trace_backend_url: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            trace_backend_url: default_trace_backend_url(),
        }
    }
}

fn default_port() -> u16 {
    3337
}
fn default_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_trace_backend_url() -> String {
    "http://localhost:16686".to_string()
}

/// Load config from gemini-dash-ui.toml in the given directory, or default.
pub fn load_config(dir: &Path) -> UiConfig {
    let path = dir.join("gemini-dash-ui.toml");
    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("failed to parse {}: {e}", path.display());
                UiConfig::default()
            }
        },
        Err(_) => UiConfig::default(),
    }
}
