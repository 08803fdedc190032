// SPDX-License-Identifier: MPL-2.0
//! This module handles the crate's configuration, including loading and saving
//! user preferences to a `settings.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use animated_frames::config::{self, Config};
//! use std::path::PathBuf;
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.memory_budget_mb = Some(128);
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//!
//! // To load/save from a specific path (e.g., for testing)
//! let temp_dir = PathBuf::from("./temp_config_dir");
//! std::fs::create_dir_all(&temp_dir).unwrap();
//! let temp_file = temp_dir.join("test_settings.toml");
//! config::save_to_path(&config, &temp_file).expect("Failed to save to path");
//! let loaded_config = config::load_from_path(&temp_file).expect("Failed to load from path");
//! assert_eq!(loaded_config.memory_budget_mb, Some(128));
//! std::fs::remove_dir_all(&temp_dir).unwrap();
//! ```

mod defaults;

pub use defaults::*;

use crate::domain::frame::{MemoryBudgetMb, WindowOverride};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "AnimatedFrames";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Decoded-frame memory budget per animation, in megabytes.
    #[serde(default)]
    pub memory_budget_mb: Option<u32>,
    /// Hard cap on resident frames (unset or 0 = no cap).
    #[serde(default)]
    pub max_cached_frames: Option<usize>,
    #[serde(default)]
    pub memory_warning_reset_secs: Option<u64>,
    /// Share of available system memory the monitor reports as budget.
    #[serde(default)]
    pub system_memory_percent: Option<u8>,
    #[serde(default)]
    pub memory_sampling_interval_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_budget_mb: Some(DEFAULT_MEMORY_BUDGET_MB),
            max_cached_frames: None,
            memory_warning_reset_secs: Some(DEFAULT_MEMORY_WARNING_RESET_SECS),
            system_memory_percent: Some(DEFAULT_SYSTEM_MEMORY_PERCENT),
            memory_sampling_interval_ms: Some(DEFAULT_SAMPLING_INTERVAL_MS),
        }
    }
}

impl Config {
    /// Memory budget, clamped to the valid range.
    #[must_use]
    pub fn memory_budget(&self) -> MemoryBudgetMb {
        self.memory_budget_mb
            .map(MemoryBudgetMb::new)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn window_override(&self) -> WindowOverride {
        WindowOverride::from(self.max_cached_frames)
    }

    /// How long a memory-warning cap stays in force.
    #[must_use]
    pub fn memory_warning_reset(&self) -> Duration {
        let secs = self
            .memory_warning_reset_secs
            .unwrap_or(DEFAULT_MEMORY_WARNING_RESET_SECS)
            .clamp(MIN_MEMORY_WARNING_RESET_SECS, MAX_MEMORY_WARNING_RESET_SECS);
        Duration::from_secs(secs)
    }

    #[must_use]
    pub fn system_memory_percent(&self) -> u8 {
        self.system_memory_percent
            .unwrap_or(DEFAULT_SYSTEM_MEMORY_PERCENT)
            .clamp(MIN_SYSTEM_MEMORY_PERCENT, MAX_SYSTEM_MEMORY_PERCENT)
    }

    #[must_use]
    pub fn memory_sampling_interval(&self) -> Duration {
        let ms = self
            .memory_sampling_interval_ms
            .unwrap_or(DEFAULT_SAMPLING_INTERVAL_MS)
            .clamp(MIN_SAMPLING_INTERVAL_MS, MAX_SAMPLING_INTERVAL_MS);
        Duration::from_millis(ms)
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

/// Loads the configuration from the platform config directory.
///
/// Returns defaults when no file exists.
pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

pub fn save(config: &Config) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Reads a configuration file; unparseable content yields defaults.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content).unwrap_or_default())
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_cache_settings() {
        let config = Config {
            memory_budget_mb: Some(256),
            max_cached_frames: Some(12),
            memory_warning_reset_secs: Some(30),
            system_memory_percent: Some(20),
            memory_sampling_interval_ms: Some(500),
        };
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        save_to_path(&config, &config_path).expect("failed to save config");
        let loaded = load_from_path(&config_path).expect("failed to load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn load_from_path_returns_default_on_invalid_toml() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "not = valid = toml").expect("failed to write invalid toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let loaded: Config = toml::from_str("memory_budget_mb = 8").expect("valid toml");
        assert_eq!(loaded.memory_budget_mb, Some(8));
        assert!(loaded.max_cached_frames.is_none());
        assert_eq!(loaded.memory_warning_reset(), Duration::from_secs(DEFAULT_MEMORY_WARNING_RESET_SECS));
    }

    #[test]
    fn accessors_clamp_out_of_range_values() {
        let config = Config {
            memory_budget_mb: Some(0),
            max_cached_frames: Some(0),
            memory_warning_reset_secs: Some(100_000),
            system_memory_percent: Some(99),
            memory_sampling_interval_ms: Some(1),
        };

        assert_eq!(config.memory_budget().value(), MIN_MEMORY_BUDGET_MB);
        assert!(config.window_override().is_unlimited());
        assert_eq!(
            config.memory_warning_reset(),
            Duration::from_secs(MAX_MEMORY_WARNING_RESET_SECS)
        );
        assert_eq!(config.system_memory_percent(), MAX_SYSTEM_MEMORY_PERCENT);
        assert_eq!(
            config.memory_sampling_interval(),
            Duration::from_millis(MIN_SAMPLING_INTERVAL_MS)
        );
    }

    #[test]
    fn save_to_path_creates_parent_directories() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("deep").join("path").join("settings.toml");

        save_to_path(&Config::default(), &config_path).expect("save should create directories");
        assert!(config_path.exists());
    }

    #[test]
    fn default_config_uses_default_budget() {
        let config = Config::default();
        assert_eq!(config.memory_budget().value(), DEFAULT_MEMORY_BUDGET_MB);
        assert!(config.window_override().is_unlimited());
    }
}
