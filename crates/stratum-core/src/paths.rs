//! Path resolution utilities.

use crate::env;
use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the Stratum base directory.
///
/// `STRATUM_HOME` wins when set; otherwise `~/.stratum`.
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = env::get_var(env::vars::STRATUM_HOME) {
        return Ok(PathBuf::from(home));
    }
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".stratum"))
}

/// Get the main config file path (~/.stratum/stratum.json5).
///
/// `STRATUM_CONFIG` overrides the location entirely.
pub fn config_file() -> Result<PathBuf, ConfigError> {
    if let Some(path) = env::get_var(env::vars::STRATUM_CONFIG) {
        return Ok(PathBuf::from(path));
    }
    Ok(base_dir()?.join("stratum.json5"))
}

/// Get the default encrypted secrets directory (~/.stratum/secrets).
pub fn secrets_dir() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("secrets"))
}
