//! Environment variable handling.
//!
//! Besides small typed getters, this module owns the [`EnvironmentWriter`]
//! seam: the only place where resolved secrets are allowed to reach the
//! host process's environment table.

use crate::error::SecurityError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::env;
use tracing::{debug, warn};

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Common environment variable names.
pub mod vars {
    /// Stratum home directory override.
    pub const STRATUM_HOME: &str = "STRATUM_HOME";

    /// Stratum config file override.
    pub const STRATUM_CONFIG: &str = "STRATUM_CONFIG";

    /// Log filter directive (takes precedence over the configured level).
    pub const STRATUM_LOG: &str = "STRATUM_LOG";

    /// Default environment for secret operations.
    pub const STRATUM_ENVIRONMENT: &str = "STRATUM_ENVIRONMENT";

    /// Default path for secret operations.
    pub const STRATUM_PATH: &str = "STRATUM_PATH";

    /// Maximum interpolation depth.
    pub const STRATUM_MAX_DEPTH: &str = "STRATUM_MAX_DEPTH";

    /// Hex-encoded 32-byte master key for the file store.
    pub const STRATUM_MASTER_KEY: &str = "STRATUM_MASTER_KEY";
}

/// Variables that must never be written from secret material.
pub const BLOCKED_ENV_VARS: &[&str] = &[
    // Dynamic linker injection
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "LD_AUDIT",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    // Runtime injection
    "NODE_OPTIONS",
    "NODE_PATH",
    "PYTHONPATH",
    "PYTHONHOME",
    "RUBYLIB",
    "PERL5LIB",
    // Shell injection
    "BASH_ENV",
    "ENV",
    "IFS",
    "PATH",
    // Other dangerous
    "GCONV_PATH",
    "SSLKEYLOGFILE",
];

/// Blocked variable prefixes.
pub const BLOCKED_ENV_PREFIXES: &[&str] = &["DYLD_", "LD_"];

/// Check if an environment variable name is blocked.
pub fn is_env_var_blocked(name: &str) -> bool {
    if BLOCKED_ENV_VARS.contains(&name) {
        return true;
    }
    BLOCKED_ENV_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Check that a name/value pair can be written without the platform
/// rejecting it (empty names, `=` and NUL are not representable).
pub fn check_env_pair(name: &str, value: &str) -> Result<(), SecurityError> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(SecurityError::InvalidEnvVarName(name.to_string()));
    }
    if value.contains('\0') {
        return Err(SecurityError::InvalidEnvVarValue(name.to_string()));
    }
    if is_env_var_blocked(name) {
        return Err(SecurityError::BlockedEnvVar(name.to_string()));
    }
    Ok(())
}

/// Capability for publishing name/value pairs into a host environment.
///
/// The secret service only ever talks to this trait, so resolution logic
/// stays testable without touching real process state.
pub trait EnvironmentWriter: Send + Sync {
    /// Whether `set` would accept this pair. Callers use it to vet a batch
    /// before writing any of it.
    fn check(&self, name: &str, value: &str) -> Result<(), SecurityError> {
        check_env_pair(name, value)
    }

    /// Write a single variable, replacing any previous value.
    fn set(&self, name: &str, value: &str) -> Result<(), SecurityError>;
}

/// Writes into the current process's environment table.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl EnvironmentWriter for ProcessEnvironment {
    fn set(&self, name: &str, value: &str) -> Result<(), SecurityError> {
        if let Err(e) = check_env_pair(name, value) {
            warn!(name, "refusing to export variable: {e}");
            return Err(e);
        }
        debug!(name, "exporting variable to process environment");
        env::set_var(name, value);
        Ok(())
    }
}

/// Records writes in memory instead of touching the process.
#[derive(Debug, Default)]
pub struct MemoryEnvironment {
    vars: Mutex<BTreeMap<String, String>>,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previously written variable.
    pub fn get(&self, name: &str) -> Option<String> {
        self.vars.lock().get(name).cloned()
    }

    /// Snapshot of every variable written so far.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.vars.lock().clone()
    }
}

impl EnvironmentWriter for MemoryEnvironment {
    fn set(&self, name: &str, value: &str) -> Result<(), SecurityError> {
        check_env_pair(name, value)?;
        self.vars.lock().insert(name.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_var_ignores_empty() {
        env::set_var("STRATUM_TEST_EMPTY", "");
        env::set_var("STRATUM_TEST_SET", "value");
        assert_eq!(get_var("STRATUM_TEST_EMPTY"), None);
        assert_eq!(get_var("STRATUM_TEST_SET").as_deref(), Some("value"));
        assert_eq!(get_var("STRATUM_TEST_NONEXISTENT"), None);
    }

    #[test]
    fn test_is_env_var_blocked() {
        assert!(is_env_var_blocked("LD_PRELOAD"));
        assert!(is_env_var_blocked("DYLD_FRAMEWORK_PATH"));
        assert!(is_env_var_blocked("NODE_OPTIONS"));
        assert!(!is_env_var_blocked("DATABASE_URL"));
        assert!(!is_env_var_blocked("HOME"));
    }

    #[test]
    fn test_check_env_pair() {
        assert!(check_env_pair("API_KEY", "abc").is_ok());
        assert!(matches!(
            check_env_pair("", "abc"),
            Err(SecurityError::InvalidEnvVarName(_))
        ));
        assert!(matches!(
            check_env_pair("A=B", "abc"),
            Err(SecurityError::InvalidEnvVarName(_))
        ));
        assert!(matches!(
            check_env_pair("API_KEY", "a\0b"),
            Err(SecurityError::InvalidEnvVarValue(_))
        ));
        assert!(matches!(
            check_env_pair("LD_PRELOAD", "/evil.so"),
            Err(SecurityError::BlockedEnvVar(_))
        ));
    }

    #[test]
    fn test_memory_environment_records_writes() {
        let env = MemoryEnvironment::new();
        env.set("DB_HOST", "localhost").unwrap();
        env.set("DB_HOST", "db.internal").unwrap();
        assert_eq!(env.get("DB_HOST").as_deref(), Some("db.internal"));
        assert_eq!(env.snapshot().len(), 1);
    }

    #[test]
    fn test_check_does_not_write() {
        let env = MemoryEnvironment::new();
        assert!(env.check("DB_HOST", "localhost").is_ok());
        assert!(matches!(
            env.check("PATH", "/tmp"),
            Err(SecurityError::BlockedEnvVar(_))
        ));
        assert!(env.snapshot().is_empty());
    }

    #[test]
    fn test_process_environment_writes_and_blocks() {
        let env = ProcessEnvironment;
        env.set("STRATUM_TEST_EXPORTED", "yes").unwrap();
        assert_eq!(get_var("STRATUM_TEST_EXPORTED").as_deref(), Some("yes"));

        assert!(env.set("LD_PRELOAD", "/evil.so").is_err());
    }
}
