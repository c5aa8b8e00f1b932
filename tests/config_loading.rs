//! Integration test: Configuration utilities
//!
//! Tests config path resolution and host config loading.

use pusher_host::bin_common::{load_config_from_env, BridgeConfig, ConfigError, ConfigType};
use std::env;
use std::path::PathBuf;

fn temp_config(name: &str, contents: &str) -> PathBuf {
    let path = env::temp_dir().join(format!("pusher-host-{}-{}.yaml", name, std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_bridge_config_path_default_and_override() {
    // Single test touches the variable to avoid races between test threads
    env::remove_var("BRIDGE_CONFIG_PATH");
    let config_path = load_config_from_env(ConfigType::Bridge);
    assert_eq!(config_path.to_str().unwrap(), "config/bridge.yaml");

    env::set_var("BRIDGE_CONFIG_PATH", "/etc/bridge.yaml");
    let config_path = load_config_from_env(ConfigType::Bridge);
    assert_eq!(config_path.to_str().unwrap(), "/etc/bridge.yaml");
    env::remove_var("BRIDGE_CONFIG_PATH");
}

#[test]
fn test_custom_config() {
    let custom = ConfigType::Custom("custom/path.yaml".to_string());
    let config_path = load_config_from_env(custom);

    assert_eq!(config_path.to_str().unwrap(), "custom/path.yaml");
}

#[test]
fn test_missing_file_uses_defaults() {
    let config = BridgeConfig::load("definitely/not/here.yaml").unwrap();
    assert_eq!(config, BridgeConfig::default());
}

#[test]
fn test_load_from_file() {
    let path = temp_config("load", "log_level: debug\nemit_diagnostics: false\n");
    let config = BridgeConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.log_level, "debug");
    assert!(!config.emit_diagnostics);
}

#[test]
fn test_invalid_level_in_file() {
    let path = temp_config("invalid", "log_level: shouting\n");
    let result = BridgeConfig::load(&path);
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_shipped_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/bridge.yaml");
    let config = BridgeConfig::load(path).unwrap();
    assert_eq!(config.log_level, "info");
}
