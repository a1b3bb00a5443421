//! Shared fixtures for the Stratum integration tests.

use std::sync::Arc;

use stratum_core::config::SecretsConfig;
use stratum_core::MemoryEnvironment;
use stratum_secrets::{generate_key, FileSecretStore, SecretService};
use tempfile::TempDir;

/// A service over an encrypted file store in a fresh temp directory.
///
/// The returned `TempDir` must outlive the service.
pub fn file_backed_service() -> (SecretService, Arc<MemoryEnvironment>, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let store = FileSecretStore::new(dir.path().to_path_buf(), &generate_key())
        .expect("create file store");
    let env = Arc::new(MemoryEnvironment::new());
    let service = SecretService::new(Arc::new(store), SecretsConfig::default())
        .with_environment_writer(env.clone());
    (service, env, dir)
}
