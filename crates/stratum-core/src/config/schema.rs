//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main Stratum configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Secret resolution defaults.
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// Local storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied to secret operations when the caller leaves a field unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Environment used when none is given.
    #[serde(default = "default_environment")]
    pub default_environment: String,

    /// Folder path used when none is given.
    #[serde(default = "default_path")]
    pub default_path: String,

    /// Maximum nesting of `${NAME}` references.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// How listings treat names that exist in both shared and personal scope.
    #[serde(default)]
    pub list_view: ListView,

    /// What a listing does when one record fails to resolve.
    #[serde(default)]
    pub list_errors: ListErrorPolicy,
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_path() -> String {
    "/".to_string()
}

fn default_max_depth() -> usize {
    10
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            default_environment: default_environment(),
            default_path: default_path(),
            max_depth: default_max_depth(),
            list_view: ListView::default(),
            list_errors: ListErrorPolicy::default(),
        }
    }
}

/// Listing view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListView {
    /// Every record, shared and personal, each tagged with its own type.
    #[default]
    Dual,
    /// One entry per name, the personal value preferred.
    Effective,
}

/// Listing failure policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListErrorPolicy {
    /// Abort the whole listing on the first resolution error.
    #[default]
    FailFast,
    /// Log and omit records whose references cannot be resolved.
    Skip,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the file-backed store. Defaults to `~/.stratum/secrets`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Environment variable holding the hex-encoded master key.
    #[serde(default = "default_master_key_env")]
    pub master_key_env: String,
}

fn default_master_key_env() -> String {
    crate::env::vars::STRATUM_MASTER_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            master_key_env: default_master_key_env(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
