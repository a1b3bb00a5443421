//! Core types for secret management.
//!
//! Records are stored with their raw (unexpanded) values; reads hand back
//! [`ResolvedSecret`]s whose values are wrapped in a zeroizing string.

use serde::{Deserialize, Serialize};
use std::fmt;
use stratum_core::config::{ListErrorPolicy, ListView, SecretsConfig};
use stratum_core::SecretString;

use crate::error::{Result, SecretError};

/// Maximum allowed length for a secret name.
pub const MAX_NAME_LEN: usize = 128;

/// Visibility of a record within an `(environment, path)` pair.
///
/// Ordering puts `Shared` before `Personal`, which is the order listings
/// return (and mirror) entries that share a name.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SecretType {
    #[default]
    Shared,
    Personal,
}

impl SecretType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Personal => "personal",
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A visibility partition: `(environment, path, type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretScope {
    pub environment: String,
    pub path: String,
    #[serde(rename = "type")]
    pub secret_type: SecretType,
}

impl SecretScope {
    /// Build a validated scope.
    pub fn new(
        environment: impl Into<String>,
        path: impl Into<String>,
        secret_type: SecretType,
    ) -> Result<Self> {
        let scope = Self {
            environment: environment.into(),
            path: path.into(),
            secret_type,
        };
        validate_environment(&scope.environment)?;
        validate_path(&scope.path)?;
        Ok(scope)
    }

    /// True when this scope lives in the given `(environment, path)` folder.
    pub fn same_folder(&self, environment: &str, path: &str) -> bool {
        self.environment == environment && self.path == path
    }
}

/// A stored secret with its unexpanded value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub name: String,
    /// Raw value; may contain `${NAME}` references.
    pub raw_value: String,
    pub scope: SecretScope,
}

impl SecretRecord {
    pub fn new(name: impl Into<String>, raw_value: impl Into<String>, scope: SecretScope) -> Self {
        Self {
            name: name.into(),
            raw_value: raw_value.into(),
            scope,
        }
    }

    pub fn secret_type(&self) -> SecretType {
        self.scope.secret_type
    }

    /// Storage key of this record.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            environment: self.scope.environment.clone(),
            path: self.scope.path.clone(),
            name: self.name.clone(),
            secret_type: self.scope.secret_type,
        }
    }
}

/// Unique identity of a record: `(environment, path, name, type)`.
///
/// Field order drives `Ord`, so a sorted collection groups a folder's
/// records by name with the shared entry first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub environment: String,
    pub path: String,
    pub name: String,
    pub secret_type: SecretType,
}

impl RecordKey {
    pub fn new(name: impl Into<String>, scope: &SecretScope) -> Self {
        Self {
            environment: scope.environment.clone(),
            path: scope.path.clone(),
            name: name.into(),
            secret_type: scope.secret_type,
        }
    }
}

/// Output of every read or write operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSecret {
    pub name: String,
    pub value: SecretString,
    #[serde(rename = "type")]
    pub secret_type: SecretType,
    pub environment: String,
    pub path: String,
}

impl ResolvedSecret {
    /// Pair a record with a value (raw or expanded).
    pub fn from_record(record: &SecretRecord, value: impl Into<String>) -> Self {
        Self {
            name: record.name.clone(),
            value: SecretString::new(value),
            secret_type: record.scope.secret_type,
            environment: record.scope.environment.clone(),
            path: record.scope.path.clone(),
        }
    }

    /// Expose the plaintext value.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }
}

/// Per-call options for single-secret operations.
///
/// Unset fields fall back to [`SecretsConfig`] defaults; an unset type means
/// "shared" for creation and "personal over shared" for lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretOptions {
    pub secret_type: Option<SecretType>,
    pub environment: Option<String>,
    pub path: Option<String>,
}

impl SecretOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Self {
        Self::default().with_type(SecretType::Shared)
    }

    pub fn personal() -> Self {
        Self::default().with_type(SecretType::Personal)
    }

    pub fn with_type(mut self, secret_type: SecretType) -> Self {
        self.secret_type = Some(secret_type);
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Resolve the `(environment, path)` pair against defaults.
    pub(crate) fn folder(&self, defaults: &SecretsConfig) -> Result<(String, String)> {
        let environment = self
            .environment
            .clone()
            .unwrap_or_else(|| defaults.default_environment.clone());
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| defaults.default_path.clone());
        validate_environment(&environment)?;
        validate_path(&path)?;
        Ok((environment, path))
    }
}

/// Options for listing a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub environment: Option<String>,
    pub path: Option<String>,
    /// Only list records of this type.
    pub secret_type: Option<SecretType>,
    /// Write each returned name/value into the host environment.
    pub mirror_to_host_environment: bool,
    /// Expand `${NAME}` references in every returned value.
    pub include_resolved_references: bool,
    /// Overrides `SecretsConfig::list_view`.
    pub view: Option<ListView>,
    /// Overrides `SecretsConfig::list_errors`.
    pub errors: Option<ListErrorPolicy>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn only(mut self, secret_type: SecretType) -> Self {
        self.secret_type = Some(secret_type);
        self
    }

    pub fn mirror_to_host_environment(mut self, enabled: bool) -> Self {
        self.mirror_to_host_environment = enabled;
        self
    }

    pub fn include_resolved_references(mut self, enabled: bool) -> Self {
        self.include_resolved_references = enabled;
        self
    }

    pub fn view(mut self, view: ListView) -> Self {
        self.view = Some(view);
        self
    }

    pub fn errors(mut self, policy: ListErrorPolicy) -> Self {
        self.errors = Some(policy);
        self
    }

    pub(crate) fn as_secret_options(&self) -> SecretOptions {
        SecretOptions {
            secret_type: self.secret_type,
            environment: self.environment.clone(),
            path: self.path.clone(),
        }
    }
}

/// Validate that a secret name can be stored and referenced.
///
/// Allowed: ASCII alphanumeric and underscore, the same alphabet as a
/// `${NAME}` reference. Max length 128.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SecretError::Validation(
            "secret name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(SecretError::Validation(format!(
            "secret name exceeds maximum length of {MAX_NAME_LEN} characters"
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SecretError::Validation(format!(
            "secret name contains invalid characters (allowed: alphanumeric, underscore): {name}"
        )));
    }
    Ok(())
}

/// Validate an environment slug (alphanumeric, underscore, hyphen).
pub fn validate_environment(environment: &str) -> Result<()> {
    if environment.is_empty() {
        return Err(SecretError::Validation(
            "environment must not be empty".to_string(),
        ));
    }
    if !environment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(SecretError::Validation(format!(
            "environment contains invalid characters: {environment}"
        )));
    }
    Ok(())
}

/// Validate a folder path. Must be absolute and free of `..` segments.
pub fn validate_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(SecretError::Validation(format!(
            "path must start with '/': {path}"
        )));
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(SecretError::Validation(format!(
            "path must not contain '..' segments: {path}"
        )));
    }
    Ok(())
}
