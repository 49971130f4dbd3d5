//! Tests for TOML atomic write utilities
//!
//! Covers:
//! - Atomic file operations (temp + rename)
//! - Field preservation on rewrite
//! - Owner-only permissions (Unix)

use bb_common::config::{
    load_toml_config, write_toml_config, LoggingConfig, TomlConfig, VisionConfig,
};
#[cfg(unix)]
use bb_common::config::check_toml_permissions_loose;
use std::path::PathBuf;
use tempfile::TempDir;

fn sample_config() -> TomlConfig {
    TomlConfig {
        root_folder: Some(PathBuf::from("/bowling")),
        port: 5731,
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        vision: VisionConfig::default(),
        demo_mode: false,
        vision_api_key: Some("key123".to_string()),
    }
}

#[test]
fn test_atomic_write_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("test.toml");

    write_toml_config(&sample_config(), &target).unwrap();

    assert!(target.exists());
    assert!(!temp_dir.path().join("test.toml.tmp").exists());
}

#[test]
fn test_atomic_write_content_contains_key() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("test.toml");

    write_toml_config(&sample_config(), &target).unwrap();

    let content = std::fs::read_to_string(&target).unwrap();
    assert!(content.contains("vision_api_key"));
    assert!(content.contains("key123"));
}

#[test]
fn test_rewrite_replaces_previous_values() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("test.toml");

    write_toml_config(&sample_config(), &target).unwrap();

    let mut updated = load_toml_config(&target).unwrap();
    updated.vision_api_key = Some("rotated".to_string());
    write_toml_config(&updated, &target).unwrap();

    let parsed = load_toml_config(&target).unwrap();
    assert_eq!(parsed.vision_api_key.as_deref(), Some("rotated"));
    assert_eq!(parsed.root_folder, Some(PathBuf::from("/bowling")));
    assert_eq!(parsed.port, 5731);
    assert_eq!(parsed.logging.level, "debug");
}

#[test]
#[cfg(unix)]
fn test_atomic_write_sets_permissions_0600() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("test.toml");

    write_toml_config(&sample_config(), &target).unwrap();

    let mode = std::fs::metadata(&target).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert!(!check_toml_permissions_loose(&target).unwrap());
}

#[test]
#[cfg(unix)]
fn test_check_permissions_detects_loose() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("test.toml");

    std::fs::write(&target, "port = 5730").unwrap();
    let mut perms = std::fs::metadata(&target).unwrap().permissions();
    perms.set_mode(0o644);
    std::fs::set_permissions(&target, perms).unwrap();

    assert!(check_toml_permissions_loose(&target).unwrap());
}
