//! Configuration loading and persistence.

use super::{Config, ListErrorPolicy, ListView, LogFormat, LogLevel};
use crate::env;
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound accepted for `secrets.max_depth`.
pub const MAX_DEPTH_LIMIT: usize = 64;

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to the default path.
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let path = paths::config_file()?;
        self.save(&path)
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to a JSON5-compatible string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 has no serializer; plain JSON is valid JSON5.
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from the default path, falling back to defaults if no file exists.
    ///
    /// Environment overrides are applied in both cases.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let mut config = match Self::load_default() {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => Self::default(),
            Err(e) => return Err(e),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `STRATUM_ENVIRONMENT`, `STRATUM_PATH` and `STRATUM_MAX_DEPTH`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(environment) = env::get_var(env::vars::STRATUM_ENVIRONMENT) {
            self.secrets.default_environment = environment;
        }
        if let Some(path) = env::get_var(env::vars::STRATUM_PATH) {
            self.secrets.default_path = path;
        }
        if let Some(raw) = env::get_var(env::vars::STRATUM_MAX_DEPTH) {
            self.secrets.max_depth = raw.parse().map_err(|_| {
                ConfigError::Parse(format!(
                    "{} must be a positive integer, got {raw:?}",
                    env::vars::STRATUM_MAX_DEPTH
                ))
            })?;
        }
        Ok(())
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.secrets.default_environment.trim().is_empty() {
            errors.push("Default environment must not be empty".to_string());
        }

        if !self.secrets.default_path.starts_with('/') {
            errors.push(format!(
                "Default path must start with '/', got {:?}",
                self.secrets.default_path
            ));
        }

        if self.secrets.max_depth == 0 || self.secrets.max_depth > MAX_DEPTH_LIMIT {
            errors.push(format!(
                "Max interpolation depth must be 1-{}, got {}",
                MAX_DEPTH_LIMIT, self.secrets.max_depth
            ));
        }

        if self.storage.master_key_env.trim().is_empty() {
            errors.push("Master key environment variable name must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Resolve the storage directory, falling back to `~/.stratum/secrets`.
    pub fn storage_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.dir {
            Some(dir) => Ok(dir.clone()),
            None => paths::secrets_dir(),
        }
    }
}

/// Builder for programmatic configuration.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default environment.
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.config.secrets.default_environment = environment.into();
        self
    }

    /// Set the default folder path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.secrets.default_path = path.into();
        self
    }

    /// Set the maximum interpolation depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.secrets.max_depth = depth;
        self
    }

    pub fn list_view(mut self, view: ListView) -> Self {
        self.config.secrets.list_view = view;
        self
    }

    pub fn list_errors(mut self, policy: ListErrorPolicy) -> Self {
        self.config.secrets.list_errors = policy;
        self
    }

    /// Set the file store directory.
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.storage.dir = Some(dir.into());
        self
    }

    /// Set the variable the master key is read from.
    pub fn master_key_env(mut self, name: impl Into<String>) -> Self {
        self.config.storage.master_key_env = name.into();
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    /// Build the config.
    pub fn build(self) -> Config {
        self.config
    }

    /// Validate and build the config, returning an error if validation fails.
    pub fn build_validated(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
