//! Configuration module
//!
//! Handles loading and saving verifier configuration.

mod schema;

pub use schema::{Config, HashingConfig, LedgerConfig, NetworkConfig, SourcesConfig};

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Get the configuration directory path
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("adb-verify")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load configuration from disk, falling back to defaults when the file is absent
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

    if !path.exists() {
        tracing::debug!("No configuration at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| Error::read(&path, e))?;
    let config: Config =
        toml::from_str(&content).map_err(|source| Error::Config { path, source })?;
    Ok(config)
}

/// Save configuration to disk
pub fn save(config: &Config, path: &Path) -> Result<()> {
    // Ensure config directory exists
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| Error::write(dir, e))?;
    }

    let content = toml::to_string_pretty(config).map_err(Error::ConfigSerialize)?;
    std::fs::write(path, content).map_err(|e| Error::write(path, e))?;

    tracing::info!("Configuration saved to {:?}", path);
    Ok(())
}
