//! Tests for configuration loading and graceful degradation
//!
//! Missing or malformed config files must never stop startup, and the root
//! folder resolves CLI → ENV → TOML → compiled default.
//!
//! Note: tests that touch EVC_ROOT_FOLDER are marked #[serial] so they don't
//! race each other on the process environment.

use evc_common::config::{
    load_or_default, load_toml_config, CompiledDefaults, LoggingConfig, RootFolderInitializer,
    RootFolderResolver, TomlConfig, DATABASE_FILE_NAME, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.ends_with("event-concierge"));
}

#[test]
fn test_empty_config_carries_server_and_logging_defaults() {
    let config = TomlConfig::default();

    assert_eq!(config.logging.level, "info");
    assert!(config.logging.file.is_none());
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3001);
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new().resolve();

    let defaults = CompiledDefaults::for_current_platform();
    assert_eq!(root_folder, defaults.root_folder);
}

#[test]
#[serial]
fn test_resolver_env_var() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/evc-test-env-folder");

    let root_folder = RootFolderResolver::new().resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/evc-test-env-folder"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_priority_order() {
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/evc-from-toml")),
        ..Default::default()
    };

    env::remove_var(ROOT_FOLDER_ENV);
    let resolved = RootFolderResolver::new().with_toml(&config).resolve();
    assert_eq!(resolved, PathBuf::from("/tmp/evc-from-toml"));

    env::set_var(ROOT_FOLDER_ENV, "/tmp/evc-from-env");
    let resolved = RootFolderResolver::new().with_toml(&config).resolve();
    assert_eq!(resolved, PathBuf::from("/tmp/evc-from-env"));

    let resolved = RootFolderResolver::new()
        .with_toml(&config)
        .with_cli_arg(Some(PathBuf::from("/tmp/evc-from-cli")))
        .resolve();
    assert_eq!(resolved, PathBuf::from("/tmp/evc-from-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
fn test_initializer_database_path() {
    let root = PathBuf::from("/tmp/evc-test-root");
    let initializer = RootFolderInitializer::new(root.clone());

    assert_eq!(initializer.database_path(), root.join(DATABASE_FILE_NAME));
}

#[test]
fn test_initializer_creates_nested_directories_idempotently() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("level1").join("level2");

    let initializer = RootFolderInitializer::new(root.clone());
    assert!(!initializer.database_exists());

    initializer.ensure_directory_exists().unwrap();
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
}

#[test]
fn test_missing_explicit_config_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let config = load_or_default(Some(&missing));
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_malformed_config_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "this is [not toml").unwrap();

    assert!(load_toml_config(&path).is_err());
    assert_eq!(load_or_default(Some(&path)), TomlConfig::default());
}

#[test]
fn test_full_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/srv/evc"

        [logging]
        level = "debug"
        file = "/var/log/evc.log"

        [server]
        host = "0.0.0.0"
        port = 4000

        [composio]
        api_key = "secret"
        user_id = "tester"
        timeout_secs = 5
        "#,
    )
    .unwrap();

    let config = load_or_default(Some(&path));

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/evc")));
    assert_eq!(
        config.logging,
        LoggingConfig {
            level: "debug".to_string(),
            file: Some(PathBuf::from("/var/log/evc.log")),
        }
    );
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 4000);
    assert_eq!(config.composio.api_key.as_deref(), Some("secret"));
    assert_eq!(config.composio.user_id.as_deref(), Some("tester"));
    assert_eq!(config.composio.timeout_secs, 5);
    assert_eq!(config.composio.base_url, "https://backend.composio.dev/api/v3");
}

#[test]
fn test_toml_roundtrip_omits_absent_key() {
    let config = TomlConfig::default();
    let text = toml::to_string(&config).unwrap();

    assert!(!text.contains("api_key"));
    let parsed: TomlConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}
