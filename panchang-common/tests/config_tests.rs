//! Configuration loading and root folder resolution
//!
//! Tests touching PANCHANG_ROOT_FOLDER are marked #[serial] so env
//! mutations don't race.

use panchang_common::config::{
    default_root_folder, load_or_default, load_toml_config, write_toml_config, EnrichmentConfig,
    RootFolderInitializer, RootFolderResolver, TomlConfig, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root = RootFolderResolver::new().resolve();
    assert_eq!(root, default_root_folder());
    assert!(root.ends_with("panchang") || root.ends_with("panchang_data"));
}

#[test]
#[serial]
fn test_resolver_priority_order() {
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/panchang-from-toml")),
        ..TomlConfig::default()
    };

    env::remove_var(ROOT_FOLDER_ENV);
    let from_toml = RootFolderResolver::new().with_toml(&toml).resolve();
    assert_eq!(from_toml, PathBuf::from("/tmp/panchang-from-toml"));

    env::set_var(ROOT_FOLDER_ENV, "/tmp/panchang-from-env");
    let from_env = RootFolderResolver::new().with_toml(&toml).resolve();
    assert_eq!(from_env, PathBuf::from("/tmp/panchang-from-env"));

    let from_cli = RootFolderResolver::new()
        .with_toml(&toml)
        .with_cli(Some(PathBuf::from("/tmp/panchang-from-cli")))
        .resolve();
    assert_eq!(from_cli, PathBuf::from("/tmp/panchang-from-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
fn test_initializer_creates_directory_idempotently() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("nested").join("root");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("panchang.db"));
    assert!(!initializer.database_exists());
}

#[test]
fn test_write_then_load_preserves_fields() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("config.toml");

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/srv/panchang")),
        port: Some(8123),
        enrichment: EnrichmentConfig {
            endpoint: Some("https://enrich.example/v1/month".to_string()),
            api_key: Some("key123".to_string()),
            ..EnrichmentConfig::default()
        },
        ..TomlConfig::default()
    };

    write_toml_config(&config, &target).unwrap();

    assert!(target.exists());
    assert!(!temp_dir.path().join("config.toml.tmp").exists());
    assert_eq!(load_toml_config(&target).unwrap(), config);
}

#[cfg(unix)]
#[test]
fn test_written_config_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("config.toml");
    write_toml_config(&TomlConfig::default(), &target).unwrap();

    let mode = std::fs::metadata(&target).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_missing_config_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_or_default(Some(&temp_dir.path().join("absent.toml")));
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_malformed_config_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("broken.toml");
    std::fs::write(&target, "port = \"not a number\"\n[sync\n").unwrap();

    assert!(load_toml_config(&target).is_err());
    assert_eq!(load_or_default(Some(&target)), TomlConfig::default());
}
