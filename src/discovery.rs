//! Locates the collector log Gemini CLI wrote most recently.
//!
//! Gemini CLI keeps one directory per project under `~/.gemini/tmp/`, each
//! with its own `otel/collector.log`. The most recently modified project
//! directory that has a log wins.
use glob::{glob, Pattern};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Return the collector log in the newest directory under `root` that has
/// one at `relative`. `None` if `root` is missing or no directory has a log.
pub fn latest_collector_log(root: &Path, relative: &Path) -> Option<PathBuf> {
    if !root.is_dir() {
        debug!(root = %root.display(), "gemini tmp directory not found");
        return None;
    }

    let pattern = format!("{}/*", Pattern::escape(&root.to_string_lossy()));
    let entries = match glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(%pattern, error = %e, "invalid discovery pattern");
            return None;
        }
    };

    let mut dirs: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|p| p.is_dir())
        .filter_map(|p| {
            let modified = std::fs::metadata(&p).ok()?.modified().ok()?;
            Some((modified, p))
        })
        .collect();
    dirs.sort_by(|a, b| b.0.cmp(&a.0));

    let found = dirs
        .into_iter()
        .map(|(_, dir)| dir.join(relative))
        .find(|log| log.is_file());
    match &found {
        Some(log) => debug!(log = %log.display(), "found collector log"),
        None => debug!(root = %root.display(), "no collector log under gemini tmp directory"),
    }
    found
}
