//! Storage Layer
//!
//! Locates the per-user config and data directories and persists
//! region presets.

pub mod presets;

use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{self, AppConfig};

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "pagetoolkit", "PageToolKit")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = project_dirs()?.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;
    Ok(data_dir)
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}

/// Path of the main configuration file
pub fn config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Load configuration from the config directory, or fall back to defaults
pub fn load_or_default_config() -> AppConfig {
    if let Ok(path) = config_path() {
        if path.exists() {
            match config::load_config(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    return config;
                }
                Err(e) => warn!("Ignoring unreadable configuration {:?}: {}", path, e),
            }
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

/// Persist configuration; failures are only logged
pub fn persist_config(config: &AppConfig) {
    let result = config_path().and_then(|path| config::save_config(config, &path));
    if let Err(e) = result {
        warn!("Could not save configuration: {}", e);
    }
}
