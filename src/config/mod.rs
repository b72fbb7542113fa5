//! Configuration module
//!
//! Handles loading and layering configuration. Precedence, lowest first:
//! defaults, configuration file, `SUITE_SCHEDULER_*` environment variables,
//! command-line flags.

mod env;
mod file;

pub use env::EnvConfig;
pub use file::{find_config, CONFIG_LOCATIONS};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{SchedulerConfig, MAX_DRAIN_TIMEOUT_SECS};
use crate::output::OutputFormat;
use crate::utils::LogLevel;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// How the suite is scheduled
    pub scheduler: SchedulerConfig,

    /// Number of suite runs
    pub rounds: u32,

    /// Output format (table, json, json-pretty, csv, summary)
    pub format: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            rounds: 1,
            format: "table".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if file::is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from the first standard location that exists, or use defaults
    pub fn load_default() -> Result<Self> {
        match find_config() {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if file::is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            anyhow::bail!("rounds must be at least 1");
        }
        if OutputFormat::from_str(&self.format).is_none() {
            anyhow::bail!("Unknown output format: {}", self.format);
        }
        if LogLevel::from_str(&self.log_level).is_none() {
            anyhow::bail!("Unknown log level: {}", self.log_level);
        }
        if let Some(secs) = self.scheduler.drain_timeout_secs {
            if secs > MAX_DRAIN_TIMEOUT_SECS {
                anyhow::bail!(
                    "drain timeout of {}s exceeds the maximum of {}s",
                    secs,
                    MAX_DRAIN_TIMEOUT_SECS
                );
            }
        }
        Ok(())
    }

    /// Apply environment overrides
    pub fn merge_env(&mut self, env: &EnvConfig) -> Result<()> {
        if let Some(mode) = env.mode {
            self.scheduler.mode = mode;
        }
        if let Some(workers) = env.workers {
            self.scheduler.worker_count = Some(workers);
        }
        if let Some(secs) = env.drain_timeout {
            self.scheduler.drain_timeout_secs = Some(secs);
        }
        if let Some(rounds) = env.rounds {
            self.rounds = rounds;
        }
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
        if let Some(level) = &env.log_level {
            self.log_level = level.clone();
        }
        self.validate().context("Invalid SUITE_SCHEDULER_* override")
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_str(&self.format).unwrap_or(OutputFormat::Table)
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_str(&self.log_level).unwrap_or_default()
    }
}
