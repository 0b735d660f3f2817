//! Runtime configuration
//!
//! Loaded from a YAML file; every field falls back to its default, so an empty
//! file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Separator between several targets listed in one reference cell
    pub reference_delimiter: char,
    /// Suffixes that mark an identifier column as a sheet's primary key
    pub key_suffixes: Vec<String>,
    /// Strip trailing commas from text cells on upload
    pub strip_trailing_commas: bool,
    /// SQLite database used by `ingest` and saved schemas
    pub db_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_delimiter: ',',
            key_suffixes: vec!["_ID".to_string(), "_KEY".to_string()],
            strip_trailing_commas: true,
            db_path: None,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}
