//! Host configuration
//!
//! Loaded from YAML. A missing file is not an error: every field has a default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings for the bridge host binaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Default log level (overridden by RUST_LOG)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Forward the diagnostics stream to stderr
    #[serde(default = "default_emit_diagnostics")]
    pub emit_diagnostics: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_emit_diagnostics() -> bool {
    true
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            emit_diagnostics: default_emit_diagnostics(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a YAML file and .env
    ///
    /// Falls back to defaults when the file does not exist.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        // Don't fail if .env doesn't exist
        dotenv::dotenv().ok();

        let config_path = config_path.as_ref();
        let config = if config_path.exists() {
            let yaml_content = std::fs::read_to_string(config_path)?;
            Self::from_yaml(&yaml_content)?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document parses as unit, not as a map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Log level: {}", self.log_level);
        info!("  Diagnostics: {}", if self.emit_diagnostics { "stderr" } else { "off" });
    }
}
