//! Encrypted file-system secret store.
//!
//! Each record is a JSON file at
//! `{base_dir}/{environment}/{hex(path)}/{shared|personal}/{name}.json`.
//! The raw value is sealed with AES-256-GCM under a key derived from the
//! master key; names and scope stay in the clear so folders can be listed
//! without decrypting anything but the values.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stratum_core::error::ConfigError;
use stratum_core::{env, Config};
use tracing::{debug, warn};

use crate::crypto::{self, EncodedBundle, SymmetricKey};
use crate::error::Result;
use crate::store::{SecretStore, StoreResult};
use crate::types::{
    validate_environment, validate_name, validate_path, RecordKey, SecretRecord, SecretScope,
    SecretType,
};

/// HKDF info string binding the storage key to this backend.
const STORAGE_KEY_INFO: &[u8] = b"stratum-file-store-v1";

/// On-disk representation of a record.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSecret {
    name: String,
    environment: String,
    path: String,
    #[serde(rename = "type")]
    secret_type: SecretType,
    /// Sealed raw value.
    value: EncodedBundle,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// A file-system-backed, encrypted secret store.
///
/// Files are created with mode `0600` and directories with `0700` on Unix.
pub struct FileSecretStore {
    base_dir: PathBuf,
    key: SymmetricKey,
}

impl FileSecretStore {
    /// Create a store rooted at `base_dir`, sealing values under a key
    /// derived from `master_key`.
    pub fn new(base_dir: PathBuf, master_key: &SymmetricKey) -> Result<Self> {
        Ok(Self {
            base_dir,
            key: master_key.derive(STORAGE_KEY_INFO)?,
        })
    }

    /// Create a store from configuration.
    ///
    /// The directory comes from `storage.dir` (default `~/.stratum/secrets`)
    /// and the hex-encoded master key from the variable named by
    /// `storage.master_key_env`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let var = &config.storage.master_key_env;
        let hex_key = env::get_var(var).ok_or_else(|| {
            ConfigError::Validation(format!("{var} is not set; expected a hex-encoded 32-byte key"))
        })?;
        let master_key = SymmetricKey::from_hex(&hex_key)
            .map_err(|e| ConfigError::Validation(format!("{var}: {e}")))?;
        debug!(var = %var, "using master key from environment variable");
        Self::new(config.storage_dir()?, &master_key)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn type_dir(&self, environment: &str, path: &str, secret_type: SecretType) -> Result<PathBuf> {
        validate_environment(environment)?;
        validate_path(path)?;
        Ok(self
            .base_dir
            .join(environment)
            .join(hex::encode(path))
            .join(secret_type.as_str()))
    }

    /// Resolve the path for a record file.
    fn record_path(&self, key: &RecordKey) -> Result<PathBuf> {
        validate_name(&key.name)?;
        Ok(self
            .type_dir(&key.environment, &key.path, key.secret_type)?
            .join(format!("{}.json", key.name)))
    }

    async fn read_stored(&self, file: &Path) -> StoreResult<Option<StoredSecret>> {
        if !file.exists() {
            return Ok(None);
        }
        let data = tokio::fs::read_to_string(file).await?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    fn open(&self, stored: StoredSecret) -> Result<SecretRecord> {
        let raw_value = stored.value.decode()?.open(&self.key)?;
        let scope = SecretScope::new(stored.environment, stored.path, stored.secret_type)?;
        Ok(SecretRecord::new(stored.name, raw_value, scope))
    }
}

/// Create `dir` (and parents) with restrictive permissions.
async fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o700);
        tokio::fs::set_permissions(dir, perms).await?;
    }

    Ok(())
}

/// Write `data` to `path` with mode 0600 on Unix.
async fn write_secret_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, data).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&temp_path, perms).await?;
    }

    tokio::fs::rename(&temp_path, path).await
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn upsert(&self, record: SecretRecord) -> StoreResult<SecretRecord> {
        let key = record.key();
        let file = self.record_path(&key)?;
        if let Some(parent) = file.parent() {
            ensure_dir(parent).await?;
        }

        let now = Utc::now();
        let created_at = match self.read_stored(&file).await {
            Ok(Some(existing)) => existing.created_at,
            _ => now,
        };

        let stored = StoredSecret {
            name: record.name.clone(),
            environment: record.scope.environment.clone(),
            path: record.scope.path.clone(),
            secret_type: record.scope.secret_type,
            value: crypto::encrypt(&record.raw_value, &self.key)?.encode(),
            created_at,
            updated_at: now,
        };

        let json = serde_json::to_string_pretty(&stored)?;
        debug!(name = %record.name, path = %file.display(), "writing secret");
        write_secret_file(&file, json.as_bytes()).await?;
        Ok(record)
    }

    async fn fetch(&self, key: &RecordKey) -> StoreResult<Option<SecretRecord>> {
        let file = self.record_path(key)?;
        match self.read_stored(&file).await? {
            Some(stored) => Ok(Some(self.open(stored)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, environment: &str, path: &str) -> StoreResult<Vec<SecretRecord>> {
        let mut records = Vec::new();

        for secret_type in [SecretType::Shared, SecretType::Personal] {
            let dir = self.type_dir(environment, path, secret_type)?;
            if !dir.exists() {
                continue;
            }

            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file = entry.path();
                if file.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }

                let stored = match self.read_stored(&file).await {
                    Ok(Some(stored)) => stored,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(path = %file.display(), "skipping malformed secret file: {e}");
                        continue;
                    }
                };
                records.push(self.open(stored)?);
            }
        }

        records.sort_by_key(|r| r.key());
        Ok(records)
    }

    async fn remove(&self, key: &RecordKey) -> StoreResult<Option<SecretRecord>> {
        let Some(existing) = self.fetch(key).await? else {
            return Ok(None);
        };

        let file = self.record_path(key)?;
        debug!(name = %key.name, path = %file.display(), "deleting secret");
        tokio::fs::remove_file(&file).await?;
        Ok(Some(existing))
    }
}
