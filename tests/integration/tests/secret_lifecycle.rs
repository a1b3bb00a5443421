//! End-to-end secret lifecycle over the encrypted file store.
//!
//! Exercises the service the way a client would: shared and personal values
//! for the same name, nested references, and listing with expansion.

use stratum_core::config::ListView;
use stratum_integration_tests::file_backed_service;
use stratum_secrets::{ListOptions, SecretError, SecretOptions, SecretService, SecretType};

async fn seed(service: &SecretService) {
    let shared = SecretOptions::new();
    service.create("KEY_ONE", "KEY_ONE_VAL", &shared).await.unwrap();
    service
        .create("KEY_ONE", "KEY_ONE_VAL_PERSONAL", &SecretOptions::personal())
        .await
        .unwrap();
    service.create("KEY_TWO", "KEY_TWO_VAL", &shared).await.unwrap();
    service
        .create("NESTED_SECRET_1", "${NESTED_SECRET_2}", &shared)
        .await
        .unwrap();
    service
        .create("NESTED_SECRET_2", "${NESTED_SECRET_3}", &shared)
        .await
        .unwrap();
    service
        .create("NESTED_SECRET_3", "DEEPLY_NESTED_SECRET", &shared)
        .await
        .unwrap();
    service.create("PROTOCOL", "https", &shared).await.unwrap();
    service.create("DOMAIN", "www.example.com", &shared).await.unwrap();
    service
        .create("FULL_HOST", "${PROTOCOL}://${DOMAIN}", &shared)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_personal_and_shared_reads() {
    let (service, _env, _dir) = file_backed_service();
    seed(&service).await;

    let personal = service
        .get("KEY_ONE", &SecretOptions::personal().environment("dev").path("/"))
        .await
        .unwrap();
    assert_eq!(personal.name, "KEY_ONE");
    assert_eq!(personal.expose(), "KEY_ONE_VAL_PERSONAL");
    assert_eq!(personal.secret_type, SecretType::Personal);

    let shared = service
        .get("KEY_ONE", &SecretOptions::shared())
        .await
        .unwrap();
    assert_eq!(shared.expose(), "KEY_ONE_VAL");
    assert_eq!(shared.secret_type, SecretType::Shared);

    let plain = service.get("KEY_TWO", &SecretOptions::new()).await.unwrap();
    assert_eq!(plain.expose(), "KEY_TWO_VAL");
    assert_eq!(plain.secret_type, SecretType::Shared);
}

#[tokio::test]
async fn test_create_update_delete_cycle() {
    let (service, _env, _dir) = file_backed_service();

    let created = service
        .create("KEY_THREE", "KEY_THREE_VAL", &SecretOptions::new())
        .await
        .unwrap();
    assert_eq!(created.expose(), "KEY_THREE_VAL");
    assert_eq!(created.secret_type, SecretType::Shared);

    let updated = service
        .update("KEY_THREE", "FOO", &SecretOptions::new())
        .await
        .unwrap();
    assert_eq!(updated.expose(), "FOO");
    assert_eq!(updated.secret_type, SecretType::Shared);

    service
        .create("KEY_FOUR", "KEY_FOUR_VAL", &SecretOptions::new())
        .await
        .unwrap();
    let personal = service
        .create("KEY_FOUR", "KEY_FOUR_VAL_PERSONAL", &SecretOptions::personal())
        .await
        .unwrap();
    assert_eq!(personal.expose(), "KEY_FOUR_VAL_PERSONAL");
    assert_eq!(personal.secret_type, SecretType::Personal);

    let updated = service
        .update("KEY_FOUR", "BAR", &SecretOptions::personal())
        .await
        .unwrap();
    assert_eq!(updated.expose(), "BAR");
    assert_eq!(updated.secret_type, SecretType::Personal);

    let deleted = service
        .delete("KEY_FOUR", &SecretOptions::personal())
        .await
        .unwrap();
    assert_eq!(deleted.expose(), "BAR");
    assert_eq!(deleted.secret_type, SecretType::Personal);

    let deleted = service
        .delete("KEY_FOUR", &SecretOptions::new())
        .await
        .unwrap();
    assert_eq!(deleted.expose(), "KEY_FOUR_VAL");
    assert_eq!(deleted.secret_type, SecretType::Shared);
}

#[tokio::test]
async fn test_shared_create_leaves_personal_alone() {
    let (service, _env, _dir) = file_backed_service();
    service
        .create("API_URL", "personal-url", &SecretOptions::personal())
        .await
        .unwrap();
    service
        .create("API_URL", "shared-url", &SecretOptions::shared())
        .await
        .unwrap();

    let personal = service
        .get("API_URL", &SecretOptions::personal())
        .await
        .unwrap();
    assert_eq!(personal.expose(), "personal-url");
}

#[tokio::test]
async fn test_nested_values_when_listing() {
    let (service, _env, _dir) = file_backed_service();
    seed(&service).await;

    let secrets = service
        .list_all(
            &ListOptions::new()
                .environment("dev")
                .path("/")
                .include_resolved_references(true),
        )
        .await
        .unwrap();

    for (expected, count) in [
        ("DEEPLY_NESTED_SECRET", 3),
        ("https", 1),
        ("www.example.com", 1),
        ("https://www.example.com", 1),
    ] {
        let found = secrets.iter().filter(|s| s.expose() == expected).count();
        assert_eq!(found, count, "value {expected}");
    }
}

#[tokio::test]
async fn test_listing_views_and_mirroring() {
    let (service, env, _dir) = file_backed_service();
    seed(&service).await;

    let dual = service.list_all(&ListOptions::new()).await.unwrap();
    let key_one: Vec<SecretType> = dual
        .iter()
        .filter(|s| s.name == "KEY_ONE")
        .map(|s| s.secret_type)
        .collect();
    assert_eq!(key_one, vec![SecretType::Shared, SecretType::Personal]);

    let effective = service
        .list_all(
            &ListOptions::new()
                .view(ListView::Effective)
                .include_resolved_references(true)
                .mirror_to_host_environment(true),
        )
        .await
        .unwrap();
    assert_eq!(effective.len(), dual.len() - 1);

    assert_eq!(env.get("KEY_ONE").as_deref(), Some("KEY_ONE_VAL_PERSONAL"));
    assert_eq!(env.get("FULL_HOST").as_deref(), Some("https://www.example.com"));
    assert_eq!(env.get("NESTED_SECRET_1").as_deref(), Some("DEEPLY_NESTED_SECRET"));
}

#[tokio::test]
async fn test_cycle_is_reported_not_hung() {
    let (service, _env, _dir) = file_backed_service();
    service.create("A", "${B}", &SecretOptions::new()).await.unwrap();
    service.create("B", "${A}", &SecretOptions::new()).await.unwrap();

    match service.get("A", &SecretOptions::new()).await {
        Err(SecretError::CircularReference { chain }) => assert_eq!(chain, vec!["A", "B", "A"]),
        other => panic!("expected CircularReference, got {other:?}"),
    }
}
