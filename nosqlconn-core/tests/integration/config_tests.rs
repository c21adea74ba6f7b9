//! Configuration directory workflow: settings, factory and profiles together

use nosqlconn_core::{
    AppSettings, ConfigError, ConfigManager, ConnectionType, NsDisplayStrategy, ProfileStore,
    TracingLevel,
};
use tempfile::TempDir;

#[test]
fn fresh_directory_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = ConfigManager::with_config_dir(dir.path().join("nosqlconn"));

    let settings = config.load_settings().unwrap();
    assert_eq!(settings, AppSettings::default());

    let (store, skipped) = config.load_profiles(&config.create_factory(&settings)).unwrap();
    assert!(store.is_empty());
    assert!(skipped.is_empty());
}

#[test]
fn settings_drive_factory_and_manager() {
    let dir = TempDir::new().unwrap();
    let config = ConfigManager::with_config_dir(dir.path());
    std::fs::write(
        config.settings_path(),
        r#"
[logging]
directory = "history"
level = "debug"

[connection]
test_timeout_secs = 3

[defaults]
ns_separator = "."
ns_display_strategy = "short_key"
logging_interval_ms = 500
"#,
    )
    .unwrap();

    let settings = config.load_settings().unwrap();
    assert_eq!(settings.logging.level, TracingLevel::Debug);

    let factory = config.create_factory(&settings);
    assert_eq!(factory.logging_directory(), dir.path().join("history"));

    let mut profile = factory.create_from_type_connection(ConnectionType::Redis, "/r".into());
    settings.apply_defaults(&mut profile);
    assert_eq!(profile.ns_separator(), ".");
    assert_eq!(profile.ns_display_strategy(), NsDisplayStrategy::ShortKey);
    assert_eq!(profile.logging_interval_ms(), 500);
    assert!(profile.logging_path().starts_with(dir.path().join("history")));

    let manager = config.create_servers_manager(&settings);
    assert_eq!(manager.timeout(), std::time::Duration::from_secs(3));
}

#[test]
fn profiles_round_trip_through_config_dir() {
    let dir = TempDir::new().unwrap();
    let config = ConfigManager::with_config_dir(dir.path().join("nested").join("conf"));
    let settings = AppSettings::default();
    let factory = config.create_factory(&settings);

    let mut store = ProfileStore::new();
    store
        .add(factory.create_from_type_connection(ConnectionType::Ssdb, "/a".into()))
        .unwrap();
    store
        .add(factory.create_from_type_connection(ConnectionType::ForestDb, "/b".into()))
        .unwrap();
    config.save_profiles(&store).unwrap();

    let (loaded, skipped) = config.load_profiles(&factory).unwrap();
    assert!(skipped.is_empty());
    assert_eq!(loaded.to_settings_text(), store.to_settings_text());
}

#[test]
fn invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let config = ConfigManager::with_config_dir(dir.path());

    let mut settings = AppSettings::default();
    settings.defaults.ns_separator = String::new();
    assert!(matches!(
        config.save_settings(&settings),
        Err(ConfigError::Validation(_))
    ));

    std::fs::write(config.settings_path(), "[connection]\ntest_timeout_secs = 0\n").unwrap();
    assert!(matches!(config.load_settings(), Err(ConfigError::Validation(_))));
}
