//! CLI utilities for binaries
//!
//! Handles configuration path resolution.

use std::path::PathBuf;

/// Type of configuration to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Bridge host configuration (config/bridge.yaml)
    Bridge,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Bridge => "config/bridge.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Get the environment variable name for this config type
    pub fn env_var_name(&self) -> &str {
        match self {
            ConfigType::Bridge => "BRIDGE_CONFIG_PATH",
            ConfigType::Custom(_) => "BRIDGE_CONFIG_PATH",
        }
    }
}

/// Load configuration path from environment or use default
///
/// # Examples
/// ```
/// use pusher_host::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::Bridge);
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    match config_type {
        ConfigType::Custom(path) => path.into(),
        other => std::env::var(other.env_var_name())
            .unwrap_or_else(|_| other.default_path().to_string())
            .into(),
    }
}
