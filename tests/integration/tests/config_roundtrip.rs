//! Config save/load roundtrip integration tests.
//!
//! These tests verify that configuration can be serialized, written to disk,
//! and loaded back, and that a loaded config drives the secret service.

use std::path::Path;
use std::sync::Arc;

use stratum_core::config::{Config, ConfigBuilder, ListView};
use stratum_secrets::{generate_key, FileSecretStore, ListOptions, SecretOptions, SecretService};
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stratum.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(
        loaded.secrets.default_environment,
        config.secrets.default_environment
    );
    assert_eq!(loaded.secrets.default_path, config.secrets.default_path);
    assert_eq!(loaded.secrets.max_depth, config.secrets.max_depth);
    assert_eq!(
        loaded.storage.master_key_env,
        config.storage.master_key_env
    );
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stratum.json5");

    let config = ConfigBuilder::new()
        .environment("staging")
        .list_view(ListView::Effective)
        .build();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.secrets.default_environment, "staging");
    assert_eq!(loaded.secrets.list_view, ListView::Effective);
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/stratum.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    let result = Config::parse("not valid json");
    assert!(result.is_err());
}

#[tokio::test]
async fn test_loaded_config_drives_service() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stratum.json5");
    std::fs::write(
        &path,
        r#"{
            secrets: {
                default_environment: "staging",
                default_path: "/api",
                list_view: "effective",
            },
        }"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    config.validate().unwrap();

    let store = FileSecretStore::new(dir.path().join("secrets"), &generate_key()).unwrap();
    let service = SecretService::new(Arc::new(store), config.secrets.clone());

    let created = service
        .create("TOKEN", "shared", &SecretOptions::new())
        .await
        .unwrap();
    assert_eq!(created.environment, "staging");
    assert_eq!(created.path, "/api");

    service
        .create("TOKEN", "mine", &SecretOptions::personal())
        .await
        .unwrap();

    let listed = service.list_all(&ListOptions::new()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].expose(), "mine");
}
