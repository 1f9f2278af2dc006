/// Configuration and data root resolution.
///
/// Everything lives under one data root (`SOULSPACE_DATA_DIR`, default
/// `.soulspace`). An optional `config.json` there overrides the defaults
/// field by field.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "SOULSPACE_DATA_DIR";
pub const LOG_ENV: &str = "SOULSPACE_LOG";
pub const CONFIG_FILE: &str = "config.json";

pub fn config_path(data_root: &Path) -> PathBuf {
    data_root.join(CONFIG_FILE)
}

pub fn resolve_data_root() -> PathBuf {
    if let Some(dir) = env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    PathBuf::from(".soulspace")
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub thresholds: WrapThresholds,
    pub store: StoreConfig,
    pub log: LogConfig,
}

/// Heuristic constants used by the mood wrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapThresholds {
    /// Length of the weekly look-back window
    pub weekly_days: i64,
    pub monthly_word_cloud_size: usize,
    pub yearly_word_cloud_size: usize,
    /// A month needs at least this many entries to count as the hardest one
    pub hardest_month_min_entries: usize,
    /// Entries needed for the "journaling habit" insight
    pub habit_insight_min_entries: usize,
    /// Below this many entries the goal nudges towards consistency
    pub consistency_goal_min_entries: usize,
    /// Not leap-aware
    pub days_in_year: u32,
}

impl Default for WrapThresholds {
    fn default() -> Self {
        Self {
            weekly_days: 7,
            monthly_word_cloud_size: 20,
            yearly_word_cloud_size: 10,
            hardest_month_min_entries: 3,
            habit_insight_min_entries: 5,
            consistency_goal_min_entries: 3,
            days_in_year: 365,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file, relative to the data root
    pub db_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_file: "entries.sqlite".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load `config.json` from the data root (defaults when absent), then
    /// apply environment overrides.
    pub fn load(data_root: &Path) -> Result<Self> {
        let mut config = Self::load_from(&config_path(data_root))?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var(LOG_ENV) {
            self.log.filter = val;
        }
    }

    pub fn db_path(&self, data_root: &Path) -> PathBuf {
        data_root.join(&self.store.db_file)
    }
}
