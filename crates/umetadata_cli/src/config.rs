//! CLI configuration file.
//!
//! # Responsibility
//! - Load the optional TOML config and layer command-line overrides on top.
//!
//! # Invariants
//! - A missing `--config` file is an error; no config flag means defaults.
//! - Unknown keys are rejected so typos surface early.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_PATH: &str = "metadata.sqlite3";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Falls back to the build-mode default when unset.
    pub level: Option<String>,
    /// Rolling log directory; stderr when unset.
    pub dir: Option<PathBuf>,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config `{}`", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config `{}`", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Applies command-line overrides; `None` keeps the file value.
    pub fn with_overrides(mut self, database: Option<PathBuf>, log_level: Option<String>) -> Self {
        if let Some(path) = database {
            self.database.path = path;
        }
        if let Some(level) = log_level {
            self.logging.level = Some(level);
        }
        self
    }
}
