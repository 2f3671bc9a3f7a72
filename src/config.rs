//! User configuration.
//!
//! Read from `config.toml` in the data directory. Every key is optional and a
//! missing file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::platform::data_dir;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// City token identifying speakers from the home congregation
    pub home_congregation: String,

    /// Time given to visits created by a sync
    pub default_visit_time: String,

    /// How far ahead the needs-host list looks
    pub needs_host_months: u32,

    /// Number of dashboard timeline events
    pub timeline_limit: usize,

    /// Number of entries in the dashboard rankings
    pub top_count: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            home_congregation: "Lyon".to_string(),
            default_visit_time: "14:30".to_string(),
            needs_host_months: 2,
            timeline_limit: 5,
            top_count: 3,
        }
    }
}

impl AppConfig {
    /// Load the config next to the default data location.
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        Self::load_from(&path)
    }

    /// Load config from `path`, returning defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.home_congregation, "Lyon");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "home_congregation = \"Nice\"\ntop_count = 5\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.home_congregation, "Nice");
        assert_eq!(config.top_count, 5);
        assert_eq!(config.default_visit_time, "14:30");
        assert_eq!(config.needs_host_months, 2);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "top_count = \"many\"").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "home = \"Nice\"").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
