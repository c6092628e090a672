//! Persisted user settings (lives in the OS config directory).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_NAME: &str = "CommesseGantt";
const SETTINGS_FILE: &str = "settings.json";
const DATA_FILE: &str = "planner.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Every field falls back to its default so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Data file of the bundled store. `None` uses the OS data directory.
    pub data_file: Option<PathBuf>,
    /// Wait after the task set changes before connectors are recomputed.
    pub settle_delay_ms: u64,
    /// Initial zoom.
    pub pixels_per_day: f32,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: None,
            settle_delay_ms: 100,
            pixels_per_day: 18.0,
            log_filter: "commesse_gantt=info".into(),
        }
    }
}

impl Settings {
    /// Load from `path`; a missing or malformed file yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring malformed settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Configured data file, or the default one in the OS data directory.
    pub fn resolved_data_file(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| AppPaths::discover().data_dir.join(DATA_FILE))
    }
}

/// Where settings and data live on this machine.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Self {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", APP_NAME) {
            Self {
                config_dir: proj_dirs.config_dir().to_path_buf(),
                data_dir: proj_dirs.data_dir().to_path_buf(),
            }
        } else {
            // Fallback
            let dir = PathBuf::from(".");
            Self {
                config_dir: dir.clone(),
                data_dir: dir,
            }
        }
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "settle_delay_ms": 250 }"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.settle_delay(), Duration::from_millis(250));
        assert_eq!(settings.pixels_per_day, 18.0);
        assert_eq!(settings.log_filter, "commesse_gantt=info");
    }

    #[test]
    fn malformed_or_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(Settings::load_from(&path), Settings::default());
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("settings.json");
        let settings = Settings {
            data_file: Some(dir.path().join("data.json")),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
        assert_eq!(settings.resolved_data_file(), dir.path().join("data.json"));
    }
}
