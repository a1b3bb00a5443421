//! Secret storage backends.
//!
//! Defines the [`SecretStore`] trait the service talks to and provides
//! [`MemorySecretStore`], an in-process implementation. The encrypted
//! on-disk backend lives in [`crate::file_store`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::types::{RecordKey, SecretRecord};

/// Opaque failure raised by a store backend.
///
/// The service wraps it in [`crate::SecretError::Transport`] without
/// inspecting it, so network or disk trouble is never mistaken for a
/// missing secret.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by store backends.
pub type StoreResult<T> = std::result::Result<T, TransportError>;

/// Async trait for secret storage backends.
///
/// Backends serialize their own writes; concurrent upserts of the same key
/// are last-write-wins.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Insert or replace the record at `record.key()`.
    async fn upsert(&self, record: SecretRecord) -> StoreResult<SecretRecord>;

    /// Fetch a single record, `None` if absent.
    async fn fetch(&self, key: &RecordKey) -> StoreResult<Option<SecretRecord>>;

    /// Every record (shared and personal) in an `(environment, path)` folder.
    async fn list(&self, environment: &str, path: &str) -> StoreResult<Vec<SecretRecord>>;

    /// Remove a record, returning it if it existed.
    async fn remove(&self, key: &RecordKey) -> StoreResult<Option<SecretRecord>>;
}

/// In-memory store, ordered by `(environment, path, name, type)`.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    records: RwLock<BTreeMap<RecordKey, SecretRecord>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing records.
    pub fn with_records(records: impl IntoIterator<Item = SecretRecord>) -> Self {
        let records = records.into_iter().map(|r| (r.key(), r)).collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn upsert(&self, record: SecretRecord) -> StoreResult<SecretRecord> {
        debug!(name = %record.name, scope = %record.scope.secret_type, "memory store upsert");
        self.records.write().insert(record.key(), record.clone());
        Ok(record)
    }

    async fn fetch(&self, key: &RecordKey) -> StoreResult<Option<SecretRecord>> {
        Ok(self.records.read().get(key).cloned())
    }

    async fn list(&self, environment: &str, path: &str) -> StoreResult<Vec<SecretRecord>> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|r| r.scope.same_folder(environment, path))
            .cloned()
            .collect())
    }

    async fn remove(&self, key: &RecordKey) -> StoreResult<Option<SecretRecord>> {
        debug!(name = %key.name, scope = %key.secret_type, "memory store remove");
        Ok(self.records.write().remove(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SecretScope, SecretType};

    fn record(name: &str, value: &str, env: &str, secret_type: SecretType) -> SecretRecord {
        SecretRecord::new(name, value, SecretScope::new(env, "/", secret_type).unwrap())
    }

    #[tokio::test]
    async fn test_upsert_and_fetch() {
        let store = MemorySecretStore::new();
        let rec = record("API_KEY", "sk-abc123", "dev", SecretType::Shared);
        store.upsert(rec.clone()).await.unwrap();

        assert_eq!(store.fetch(&rec.key()).await.unwrap(), Some(rec));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_key() {
        let store = MemorySecretStore::new();
        store
            .upsert(record("KEY", "old", "dev", SecretType::Shared))
            .await
            .unwrap();
        let newer = record("KEY", "new", "dev", SecretType::Shared);
        store.upsert(newer.clone()).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.fetch(&newer.key()).await.unwrap().unwrap().raw_value, "new");
    }

    #[tokio::test]
    async fn test_shared_and_personal_coexist() {
        let store = MemorySecretStore::with_records([
            record("KEY", "personal", "dev", SecretType::Personal),
            record("KEY", "shared", "dev", SecretType::Shared),
        ]);

        let listed = store.list("dev", "/").await.unwrap();
        let types: Vec<SecretType> = listed.iter().map(|r| r.secret_type()).collect();
        assert_eq!(types, vec![SecretType::Shared, SecretType::Personal]);
    }

    #[tokio::test]
    async fn test_list_is_folder_scoped() {
        let store = MemorySecretStore::with_records([
            record("A", "1", "dev", SecretType::Shared),
            record("B", "2", "prod", SecretType::Shared),
        ]);

        let dev = store.list("dev", "/").await.unwrap();
        assert_eq!(dev.len(), 1);
        assert_eq!(dev[0].name, "A");
        assert!(store.list("dev", "/other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemorySecretStore::new();
        let rec = record("GONE", "x", "dev", SecretType::Shared);
        store.upsert(rec.clone()).await.unwrap();

        assert_eq!(store.remove(&rec.key()).await.unwrap(), Some(rec.clone()));
        assert_eq!(store.remove(&rec.key()).await.unwrap(), None);
        assert!(store.is_empty());
    }
}
