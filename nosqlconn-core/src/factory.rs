//! Construction of connection settings from engine tags and serialized lines.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{SettingsError, SettingsResult};
use crate::models::{
    ConnectionSettings, ConnectionSettingsPath, ConnectionType, EngineConfig, HostAndPort,
    NsDisplayStrategy, SETTINGS_DELIMITER, compiled_descriptor,
};

/// Builds [`ConnectionSettings`] for compiled-in engines
///
/// Every settings object created by a factory shares its logging directory.
#[derive(Debug, Clone)]
pub struct ConnectionSettingsFactory {
    logging_directory: PathBuf,
}

impl ConnectionSettingsFactory {
    /// Creates a factory writing connection logs below `logging_directory`
    #[must_use]
    pub fn new(logging_directory: impl Into<PathBuf>) -> Self {
        Self {
            logging_directory: logging_directory.into(),
        }
    }

    /// Logging root handed to new settings
    #[must_use]
    pub fn logging_directory(&self) -> &Path {
        &self.logging_directory
    }

    /// Changes the logging root for settings created from now on
    pub fn set_logging_directory(&mut self, dir: impl Into<PathBuf>) {
        self.logging_directory = dir.into();
    }

    /// Creates default settings for an engine
    ///
    /// # Panics
    ///
    /// Panics if `engine` is not compiled into this build. Callers check
    /// [`ConnectionType::is_compiled`] first.
    #[must_use]
    pub fn create_from_type_connection(
        &self,
        engine: ConnectionType,
        path: ConnectionSettingsPath,
    ) -> ConnectionSettings {
        let Some(descriptor) = compiled_descriptor(engine) else {
            panic!("cannot create settings for {engine}: engine is not compiled in");
        };
        debug!(engine = %engine, path = %path, "Creating connection settings");
        ConnectionSettings::new(path, (descriptor.default_config)(), self.logging_directory.clone())
    }

    /// Creates settings for a network engine bound to `host`
    ///
    /// # Panics
    ///
    /// Panics if `engine` is not compiled in or is not a network server
    /// (Redis, Memcached, SSDB, Pika).
    #[must_use]
    pub fn create_remote_connection(
        &self,
        engine: ConnectionType,
        path: ConnectionSettingsPath,
        host: HostAndPort,
    ) -> ConnectionSettings {
        assert!(
            engine.is_remote(),
            "cannot create remote settings for {engine}: not a compiled-in network engine"
        );
        let mut settings = self.create_from_type_connection(engine, path);
        settings.set_host(host);
        settings
    }

    /// Parses a line produced by [`ConnectionSettings::to_settings_string`]
    ///
    /// Fields are `<engine>,<path>,<interval>,<separator>,<strategy>,` followed
    /// by the command line. For SSH-capable engines the command line ends at
    /// the next delimiter and the rest of the line is the SSH blob; for all
    /// other engines the command line is the rest of the line. A malformed
    /// interval or strategy keeps its default.
    ///
    /// # Errors
    ///
    /// * [`SettingsError::InvalidEngineTag`] if field 0 is not an engine digit
    /// * [`SettingsError::EngineNotCompiled`] if the engine is not compiled in
    /// * [`SettingsError::Truncated`] if the line ends before the command line
    /// * [`SettingsError::InvalidCommandLine`] / [`SettingsError::InvalidSshInfo`]
    ///   if the payload does not parse
    ///
    /// # Panics
    ///
    /// Panics if `text` is empty.
    pub fn create_from_string_connection(&self, text: &str) -> SettingsResult<ConnectionSettings> {
        assert!(!text.is_empty(), "cannot parse connection settings from an empty string");

        let mut scanner = FieldScanner::new(text);

        let tag = scanner.next_field()?;
        let engine = parse_engine_tag(tag)?;
        if !engine.is_compiled() {
            return Err(SettingsError::EngineNotCompiled(engine));
        }
        let mut settings =
            self.create_from_type_connection(engine, ConnectionSettingsPath::default());

        let path = scanner.next_field()?;
        settings.set_connection_path_and_update_hash(ConnectionSettingsPath::new(path));

        let interval = scanner.next_field()?;
        match interval.trim().parse::<u32>() {
            Ok(ms) => settings.set_logging_interval_ms(ms),
            Err(e) => {
                warn!(path = %settings.path(), value = interval, error = %e, "Ignoring invalid logging interval");
            }
        }

        let separator = scanner.next_field()?;
        settings.set_ns_separator(separator);

        let strategy = scanner.next_field()?;
        match parse_digit(strategy).and_then(NsDisplayStrategy::from_index) {
            Some(strategy) => settings.set_ns_display_strategy(strategy),
            None => {
                warn!(path = %settings.path(), value = strategy, "Ignoring invalid namespace display strategy");
            }
        }

        if !engine.is_can_ssh_connection() {
            settings.set_command_line(scanner.remainder())?;
            return Ok(settings);
        }

        match scanner.next_field() {
            Ok(command_line) => {
                settings.set_command_line(command_line)?;
                settings.set_ssh_info(scanner.remainder().parse()?);
            }
            // No SSH blob: the rest of the line is the command line
            Err(_) => settings.set_command_line(scanner.remainder())?,
        }

        Ok(settings)
    }

    fn create(&self, engine: ConnectionType, path: ConnectionSettingsPath) -> ConnectionSettings {
        ConnectionSettings::new(path, EngineConfig::default_for(engine), self.logging_directory.clone())
    }

    /// Creates default Redis settings
    #[cfg(feature = "redis")]
    #[must_use]
    pub fn create_redis_connection(&self, path: ConnectionSettingsPath) -> ConnectionSettings {
        self.create(ConnectionType::Redis, path)
    }

    /// Creates default Memcached settings
    #[cfg(feature = "memcached")]
    #[must_use]
    pub fn create_memcached_connection(&self, path: ConnectionSettingsPath) -> ConnectionSettings {
        self.create(ConnectionType::Memcached, path)
    }

    /// Creates default SSDB settings
    #[cfg(feature = "ssdb")]
    #[must_use]
    pub fn create_ssdb_connection(&self, path: ConnectionSettingsPath) -> ConnectionSettings {
        self.create(ConnectionType::Ssdb, path)
    }

    /// Creates default LevelDB settings
    #[cfg(feature = "leveldb")]
    #[must_use]
    pub fn create_leveldb_connection(&self, path: ConnectionSettingsPath) -> ConnectionSettings {
        self.create(ConnectionType::LevelDb, path)
    }

    /// Creates default RocksDB settings
    #[cfg(feature = "rocksdb")]
    #[must_use]
    pub fn create_rocksdb_connection(&self, path: ConnectionSettingsPath) -> ConnectionSettings {
        self.create(ConnectionType::RocksDb, path)
    }

    /// Creates default UnQLite settings
    #[cfg(feature = "unqlite")]
    #[must_use]
    pub fn create_unqlite_connection(&self, path: ConnectionSettingsPath) -> ConnectionSettings {
        self.create(ConnectionType::UnQLite, path)
    }

    /// Creates default LMDB settings
    #[cfg(feature = "lmdb")]
    #[must_use]
    pub fn create_lmdb_connection(&self, path: ConnectionSettingsPath) -> ConnectionSettings {
        self.create(ConnectionType::Lmdb, path)
    }

    /// Creates default UpscaleDB settings
    #[cfg(feature = "upscaledb")]
    #[must_use]
    pub fn create_upscaledb_connection(&self, path: ConnectionSettingsPath) -> ConnectionSettings {
        self.create(ConnectionType::UpscaleDb, path)
    }

    /// Creates default ForestDB settings
    #[cfg(feature = "forestdb")]
    #[must_use]
    pub fn create_forestdb_connection(&self, path: ConnectionSettingsPath) -> ConnectionSettings {
        self.create(ConnectionType::ForestDb, path)
    }

    /// Creates default Pika settings
    #[cfg(feature = "pika")]
    #[must_use]
    pub fn create_pika_connection(&self, path: ConnectionSettingsPath) -> ConnectionSettings {
        self.create(ConnectionType::Pika, path)
    }
}

/// Positional field reader over a serialized settings line
struct FieldScanner<'a> {
    text: &'a str,
    pos: usize,
    fields: usize,
}

impl<'a> FieldScanner<'a> {
    const fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            fields: 0,
        }
    }

    /// Returns the next delimiter-terminated field
    fn next_field(&mut self) -> SettingsResult<&'a str> {
        let rest = &self.text[self.pos..];
        let Some(end) = rest.find(SETTINGS_DELIMITER) else {
            return Err(SettingsError::Truncated {
                fields: self.fields,
            });
        };
        self.pos += end + SETTINGS_DELIMITER.len_utf8();
        self.fields += 1;
        Ok(&rest[..end])
    }

    /// Everything after the last consumed delimiter
    fn remainder(&self) -> &'a str {
        &self.text[self.pos..]
    }
}

fn parse_digit(field: &str) -> Option<u8> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => ch.to_digit(10).and_then(|d| u8::try_from(d).ok()),
        _ => None,
    }
}

fn parse_engine_tag(field: &str) -> SettingsResult<ConnectionType> {
    parse_digit(field)
        .and_then(ConnectionType::from_index)
        .ok_or_else(|| SettingsError::InvalidEngineTag(field.to_string()))
}
