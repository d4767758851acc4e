use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::collector::DEFAULT_MAX_RESULTS;

/// Top-level configuration loaded from gemini-dash.toml.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DashConfig {
    pub collector: CollectorConfig,
}

/// Where to find collector logs and how much to return from them.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CollectorConfig {
    /// Root holding one directory per Gemini CLI project. `~/` is expanded.
    /// Defaults to `<home>/.gemini/tmp`.
    pub gemini_tmp_dir: Option<PathBuf>,
    /// Collector log location inside each project directory.
    pub log_relative_path: PathBuf,
    pub max_results: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            gemini_tmp_dir: None,
            log_relative_path: PathBuf::from("otel/collector.log"),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl CollectorConfig {
    /// The directory scanned for collector logs, or `None` when no home
    /// directory can be determined and none is configured.
    pub fn tmp_root(&self) -> Option<PathBuf> {
        match &self.gemini_tmp_dir {
            Some(dir) => expand_home(dir),
            None => dirs::home_dir().map(|home| home.join(".gemini").join("tmp")),
        }
    }
}

fn expand_home(path: &Path) -> Option<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map(|home| home.join(rest)),
        Err(_) => Some(path.to_path_buf()),
    }
}

/// Load config from `path`, or defaults if it is missing or invalid.
pub fn load_config(path: &Path) -> DashConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("failed to parse {}: {e}", path.display());
                DashConfig::default()
            }
        },
        Err(_) => DashConfig::default(),
    }
}
