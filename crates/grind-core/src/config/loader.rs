//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::defaults::CONFIG_FILE_NAME;
use super::types::Config;
use super::validation::validate_config;

/// Location of the per-user configuration file (`~/.grind.toml`)
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()).into());
    }
    if !path.is_file() {
        return Err(ConfigError::NotAFile(path.to_path_buf()).into());
    }

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: Config = toml::from_str(&content).map_err(ConfigError::TomlError)?;

    validate_config(&config)?;
    info!(path = %path.display(), "read config");
    Ok(config)
}

/// Load configuration from an explicit path, or from the default location
pub fn load_config_from(path: Option<&Path>) -> Result<(Config, PathBuf)> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    debug!(path = %path.display(), "loading config");
    let config = load_config(&path)?;
    Ok((config, path))
}

/// Serialize configuration to TOML
pub fn config_to_toml(config: &Config) -> Result<String> {
    Ok(toml::to_string(config).map_err(ConfigError::TomlSerError)?)
}
