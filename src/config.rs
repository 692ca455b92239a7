//! User settings persisted between runs
//!
//! Stored as `key=value` lines in `~/.wa-score-comparator.conf`. A missing or
//! unreadable file means defaults; unknown keys are ignored.

use crate::params::parse_point_input;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Source used when nothing else is configured
pub const DEFAULT_SOURCE: &str = "data_men.json";

const CONFIG_FILE_NAME: &str = ".wa-score-comparator.conf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Path or URL of the scoring table
    pub source: String,
    /// Point filter in effect when the browser was last closed
    pub last_points: Option<i64>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        BrowserConfig {
            source: DEFAULT_SOURCE.to_string(),
            last_points: None,
        }
    }
}

/// Get the config file path: ~/.wa-score-comparator.conf
pub fn config_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(CONFIG_FILE_NAME))
}

impl BrowserConfig {
    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                log::debug!("No config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse `key=value` lines. Bad point values are ignored.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "source" if !value.trim().is_empty() => {
                        config.source = value.trim().to_string()
                    }
                    "last_points" => config.last_points = parse_point_input(value).ok().flatten(),
                    _ => {}
                }
            }
        }
        config
    }

    pub fn to_file_contents(&self) -> String {
        format!(
            "source={}\nlast_points={}\n",
            self.source,
            self.last_points.map(|p| p.to_string()).unwrap_or_default()
        )
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_file_contents())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Save to the default location. Failures are logged, not returned.
    pub fn save(&self) {
        if let Some(path) = config_path() {
            if let Err(e) = self.save_to(&path) {
                log::warn!("{:#}", e);
            }
        }
    }
}
