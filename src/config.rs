//! User configuration, read from `config.toml`.
//!
//! Every field has a default, so a missing file or a file with only a few
//! keys set is valid.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::live::{LiveSettings, ScrollSpeed};

const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "repertoire.sqlite";
const LOG_FILE_NAME: &str = "repertoire.log";
const MAX_UNITS_PER_LINE: u32 = 1_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub live: LiveConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from `path`. A file that does not exist yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse TOML configuration")
    }

    /// Configured database path, or the default inside `data_dir`.
    pub fn database_path(&self, paths: &AppPaths) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| paths.data_dir.join(DB_FILE_NAME))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LiveConfig {
    /// Milliseconds between auto-scroll ticks.
    pub tick_interval_ms: u64,
    /// Starting speed percentage for new sessions (10-100).
    pub default_speed: u32,
    /// Scroll units per rendered line of chord text.
    pub units_per_line: u32,
    /// Re-measure content when the terminal is resized.
    pub refresh_metrics_on_resize: bool,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            default_speed: 50,
            units_per_line: 20,
            refresh_metrics_on_resize: true,
        }
    }
}

impl LiveConfig {
    pub fn settings(&self) -> LiveSettings {
        LiveSettings {
            tick_interval: Duration::from_millis(self.tick_interval_ms.max(1)),
            default_speed: ScrollSpeed::new(self.default_speed),
        }
    }

    pub fn units_per_line(&self) -> u32 {
        self.units_per_line.clamp(1, MAX_UNITS_PER_LINE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub min_password_len: usize,
    pub require_email_confirmation: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_len: 6,
            require_email_confirmation: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Platform locations for the config file and application data.
#[derive(Debug, Clone, PartialEq)]
pub struct AppPaths {
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "repertoire-manager")
            .ok_or_else(|| anyhow!("could not locate home directory"))?;
        Ok(Self {
            config_file: dirs.config_dir().join(CONFIG_FILE_NAME),
            data_dir: dirs.data_dir().to_path_buf(),
        })
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}
