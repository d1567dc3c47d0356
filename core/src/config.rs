//! Configuration management for kill-and-watch settings.
//!
//! Stores settings in JSON format at `~/.portreaper/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::adapters::DEFAULT_OUTPUT_LIMIT;
use crate::application::{DEFAULT_MAX_CHASE_DEPTH, DEFAULT_SETTLE_DELAY};
use crate::error::{Error, Result};

/// Settings data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Pause between a kill and the verification scan, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// How many parents one respawn chase may kill.
    #[serde(default = "default_max_chase_depth")]
    pub max_chase_depth: usize,

    /// Ceiling on the captured output of a single system command.
    #[serde(default = "default_output_limit_bytes")]
    pub output_limit_bytes: usize,

    /// Windows directory holding `System32`. Taken from `%SystemRoot%` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_root: Option<PathBuf>,
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY.as_millis() as u64
}

fn default_max_chase_depth() -> usize {
    DEFAULT_MAX_CHASE_DEPTH
}

fn default_output_limit_bytes() -> usize {
    DEFAULT_OUTPUT_LIMIT
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            max_chase_depth: default_max_chase_depth(),
            output_limit_bytes: default_output_limit_bytes(),
            system_root: None,
        }
    }
}

impl Settings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Reject values no command could run under.
    pub fn validate(&self) -> Result<()> {
        if self.output_limit_bytes == 0 {
            return Err(Error::Config(
                "Output limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration store for reading and writing [`Settings`].
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portreaper/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".portreaper").join("config.json");
        Ok(Self { config_path })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load settings from disk.
    ///
    /// Returns default settings if the file doesn't exist. Missing fields
    /// take their defaults.
    pub async fn load(&self) -> Result<Settings> {
        if !self.config_path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        settings.validate()?;

        if let Some(config_dir) = self.config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).await.map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }

    /// Set the settle delay in milliseconds.
    pub async fn set_settle_delay_ms(&self, millis: u64) -> Result<()> {
        let mut settings = self.load().await?;
        settings.settle_delay_ms = millis;
        self.save(&settings).await
    }

    /// Set the maximum number of parents a chase may kill.
    pub async fn set_max_chase_depth(&self, depth: usize) -> Result<()> {
        let mut settings = self.load().await?;
        settings.max_chase_depth = depth;
        self.save(&settings).await
    }

    /// Set the output ceiling for system commands.
    pub async fn set_output_limit_bytes(&self, limit: usize) -> Result<()> {
        let mut settings = self.load().await?;
        settings.output_limit_bytes = limit;
        self.save(&settings).await
    }

    /// Set or clear the Windows directory override.
    pub async fn set_system_root(&self, root: Option<PathBuf>) -> Result<()> {
        let mut settings = self.load().await?;
        settings.system_root = root;
        self.save(&settings).await
    }
}
