//! Vision API key resolution and TOML write-back
//!
//! Tests touching BOWLBETTER_API_KEY are marked #[serial] so they never
//! observe each other's environment.

mod helpers;

use std::collections::HashMap;

use bb_coach::config::{
    is_valid_key, resolve_vision_api_key, sync_settings_to_toml, KeySource, API_KEY_ENV_VAR,
};
use bb_coach::db::settings::set_vision_api_key;
use bb_coach::store::LocalStore;
use bb_common::config::{load_toml_config, TomlConfig};
use helpers::test_pool;
use serial_test::serial;
use tempfile::TempDir;

fn toml_with_key(key: Option<&str>) -> TomlConfig {
    TomlConfig {
        vision_api_key: key.map(str::to_string),
        ..TomlConfig::default()
    }
}

#[tokio::test]
#[serial]
async fn test_database_overrides_env_and_toml() {
    let pool = test_pool().await;
    set_vision_api_key(&pool, "db-key".to_string()).await.unwrap();
    std::env::set_var(API_KEY_ENV_VAR, "env-key");

    let resolved = resolve_vision_api_key(&pool, &toml_with_key(Some("toml-key"))).await.unwrap();
    assert_eq!(resolved, Some(("db-key".to_string(), KeySource::Database)));

    std::env::remove_var(API_KEY_ENV_VAR);
}

#[tokio::test]
#[serial]
async fn test_env_fallback_when_database_empty() {
    let pool = test_pool().await;
    std::env::set_var(API_KEY_ENV_VAR, "env-key");

    let resolved = resolve_vision_api_key(&pool, &toml_with_key(Some("toml-key"))).await.unwrap();
    assert_eq!(resolved, Some(("env-key".to_string(), KeySource::Environment)));

    std::env::remove_var(API_KEY_ENV_VAR);
}

#[tokio::test]
#[serial]
async fn test_toml_fallback_and_blank_sources_skipped() {
    let pool = test_pool().await;
    set_vision_api_key(&pool, "   ".to_string()).await.unwrap();
    std::env::set_var(API_KEY_ENV_VAR, "");

    let resolved = resolve_vision_api_key(&pool, &toml_with_key(Some("toml-key"))).await.unwrap();
    assert_eq!(resolved, Some(("toml-key".to_string(), KeySource::Toml)));

    std::env::remove_var(API_KEY_ENV_VAR);
}

#[tokio::test]
#[serial]
async fn test_no_key_anywhere() {
    let pool = test_pool().await;
    std::env::remove_var(API_KEY_ENV_VAR);

    let resolved = resolve_vision_api_key(&pool, &toml_with_key(None)).await.unwrap();
    assert!(resolved.is_none());

    let store = LocalStore::new(pool, TomlConfig::default(), None);
    assert!(store.credential().await.unwrap().is_none());
}

#[test]
fn test_is_valid_key() {
    assert!(is_valid_key("gsk_abc"));
    assert!(!is_valid_key(""));
    assert!(!is_valid_key(" \t\n"));
}

#[tokio::test]
async fn test_sync_settings_preserves_other_fields() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bb-coach.toml");
    std::fs::write(&path, "port = 6000\ndemo_mode = true\n").unwrap();

    let mut values = HashMap::new();
    values.insert("vision_api_key".to_string(), "gsk_synced".to_string());
    sync_settings_to_toml(values, &path).await.unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.vision_api_key.as_deref(), Some("gsk_synced"));
    assert_eq!(config.port, 6000);
    assert!(config.demo_mode);
}

#[tokio::test]
#[serial]
async fn test_set_credential_writes_database_and_toml() {
    std::env::remove_var(API_KEY_ENV_VAR);
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bb-coach.toml");

    let store = LocalStore::new(test_pool().await, TomlConfig::default(), Some(path.clone()));
    store.set_credential("  gsk_new  ").await.unwrap();

    assert_eq!(store.credential().await.unwrap().unwrap().expose(), "gsk_new");
    assert_eq!(store.credential_source().await.unwrap(), Some(KeySource::Database));
    assert_eq!(load_toml_config(&path).unwrap().vision_api_key.as_deref(), Some("gsk_new"));
}

#[tokio::test]
async fn test_set_credential_survives_unwritable_toml() {
    let temp_dir = TempDir::new().unwrap();
    // A directory where the file should be makes the TOML write fail
    let path = temp_dir.path().join("occupied");
    std::fs::create_dir(&path).unwrap();

    let store = LocalStore::new(test_pool().await, TomlConfig::default(), Some(path));
    store.set_credential("gsk_db_only").await.unwrap();

    let stored = bb_coach::db::settings::get_vision_api_key(store.db()).await.unwrap();
    assert_eq!(stored.as_deref(), Some("gsk_db_only"));
}
