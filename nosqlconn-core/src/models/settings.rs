//! Connection profile settings.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::engine::{ConnectionType, compiled_descriptor};
use super::engine_config::{EngineConfig, LocalConfig, RedisConfig, RemoteConfig};
use super::host::HostAndPort;
use super::path::ConnectionSettingsPath;
use super::ssh::SshInfo;
use crate::error::{SettingsError, SettingsResult};
use crate::hash::crc64;

/// Field delimiter of the serialized settings line
pub const SETTINGS_DELIMITER: char = ',';

/// Default namespace separator for hierarchical keys
pub const DEFAULT_NS_SEPARATOR: &str = ":";

/// How keys are displayed inside a namespace tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NsDisplayStrategy {
    /// Show the full key
    #[default]
    FullKey = 0,
    /// Show only the part after the last namespace separator
    ShortKey = 1,
}

impl NsDisplayStrategy {
    /// Looks up a strategy by its serialized digit
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::FullKey),
            1 => Some(Self::ShortKey),
            _ => None,
        }
    }

    /// Returns the digit used in serialized settings
    #[must_use]
    pub const fn as_index(self) -> u8 {
        self as u8
    }
}

/// Hook for front-ends that adjust settings before showing them
pub trait PrepareInGui {
    /// Runs pre-display adjustments; does nothing by default
    fn prepare_in_gui_if_needed(&mut self) {}
}

/// Configuration of one named connection
///
/// The engine is fixed by the [`EngineConfig`] variant. The content hash is
/// derived from the path and kept in sync by every path mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    path: ConnectionSettingsPath,
    hash: String,
    logging_interval_ms: u32,
    ns_separator: String,
    ns_display_strategy: NsDisplayStrategy,
    log_directory: PathBuf,
    config: EngineConfig,
}

impl ConnectionSettings {
    /// Creates settings with default namespace options and history disabled
    #[must_use]
    pub fn new(
        path: ConnectionSettingsPath,
        config: EngineConfig,
        log_directory: impl Into<PathBuf>,
    ) -> Self {
        let mut settings = Self {
            path: ConnectionSettingsPath::default(),
            hash: String::new(),
            logging_interval_ms: 0,
            ns_separator: DEFAULT_NS_SEPARATOR.to_string(),
            ns_display_strategy: NsDisplayStrategy::FullKey,
            log_directory: log_directory.into(),
            config,
        };
        settings.set_connection_path_and_update_hash(path);
        settings
    }

    /// Returns the profile path
    #[must_use]
    pub fn path(&self) -> &ConnectionSettingsPath {
        &self.path
    }

    /// Changes the profile path and refreshes the content hash
    pub fn set_path(&mut self, path: ConnectionSettingsPath) {
        self.set_connection_path_and_update_hash(path);
    }

    /// Sets the path and stores the decimal CRC-64 of its canonical form
    pub fn set_connection_path_and_update_hash(&mut self, path: ConnectionSettingsPath) {
        self.hash = crc64(0, path.as_str().as_bytes()).to_string();
        self.path = path;
    }

    /// Returns the content hash
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Returns the engine of this profile
    #[must_use]
    pub const fn connection_type(&self) -> ConnectionType {
        self.config.connection_type()
    }

    /// History sampling interval, 0 when disabled
    #[must_use]
    pub const fn logging_interval_ms(&self) -> u32 {
        self.logging_interval_ms
    }

    /// Sets the history sampling interval
    pub fn set_logging_interval_ms(&mut self, interval: u32) {
        self.logging_interval_ms = interval;
    }

    /// Returns true if key history is recorded
    #[must_use]
    pub const fn is_history_enabled(&self) -> bool {
        self.logging_interval_ms != 0
    }

    /// Namespace separator
    #[must_use]
    pub fn ns_separator(&self) -> &str {
        &self.ns_separator
    }

    /// Sets the namespace separator
    pub fn set_ns_separator(&mut self, separator: impl Into<String>) {
        self.ns_separator = separator.into();
    }

    /// Namespace display strategy
    #[must_use]
    pub const fn ns_display_strategy(&self) -> NsDisplayStrategy {
        self.ns_display_strategy
    }

    /// Sets the namespace display strategy
    pub fn set_ns_display_strategy(&mut self, strategy: NsDisplayStrategy) {
        self.ns_display_strategy = strategy;
    }

    /// Logging root this profile was created with
    #[must_use]
    pub fn log_directory(&self) -> &Path {
        &self.log_directory
    }

    /// Returns `<log_directory>/<hash><extension>`
    ///
    /// # Panics
    ///
    /// Panics if the engine is not compiled into this build, since no
    /// extension is registered for it.
    #[must_use]
    pub fn logging_path(&self) -> PathBuf {
        let engine = self.connection_type();
        let Some(descriptor) = compiled_descriptor(engine) else {
            panic!("no log extension registered for {engine}: engine is not compiled in");
        };
        self.log_directory
            .join(format!("{}{}", self.hash, descriptor.log_extension))
    }

    /// Engine configuration
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the engine configuration with another of the same engine
    ///
    /// # Panics
    ///
    /// Panics if `config` belongs to a different engine.
    pub fn replace_config(&mut self, config: EngineConfig) {
        let engine = self.connection_type();
        assert!(
            config.connection_type() == engine,
            "cannot replace {engine} configuration with {}",
            config.connection_type()
        );
        self.config = config;
    }

    /// Mutable Redis protocol configuration (Redis, Pika)
    pub fn redis_config_mut(&mut self) -> Option<&mut RedisConfig> {
        match &mut self.config {
            EngineConfig::Redis(cfg) | EngineConfig::Pika(cfg) => Some(cfg),
            _ => None,
        }
    }

    /// Mutable remote server configuration (Memcached, SSDB)
    pub fn remote_config_mut(&mut self) -> Option<&mut RemoteConfig> {
        match &mut self.config {
            EngineConfig::Memcached(cfg) | EngineConfig::Ssdb(cfg) => Some(cfg),
            _ => None,
        }
    }

    /// Mutable embedded database configuration
    pub fn local_config_mut(&mut self) -> Option<&mut LocalConfig> {
        self.config.local_mut()
    }

    /// Renders the engine command line
    #[must_use]
    pub fn command_line(&self) -> String {
        self.config.command_line()
    }

    /// Replaces the engine command line
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidCommandLine`] if the text does not
    /// parse for this engine; the settings are left unchanged.
    pub fn set_command_line(&mut self, text: &str) -> SettingsResult<()> {
        self.config.set_command_line(text)
    }

    /// Network endpoint of remote engines
    #[must_use]
    pub fn host(&self) -> Option<&HostAndPort> {
        self.config.host()
    }

    /// Sets the network endpoint
    ///
    /// # Panics
    ///
    /// Panics if the engine is not a network server.
    pub fn set_host(&mut self, host: HostAndPort) {
        let engine = self.connection_type();
        match self.config.host_mut() {
            Some(slot) => *slot = host,
            None => panic!("{engine} is not a remote engine"),
        }
    }

    /// SSH settings of Redis-compatible engines
    #[must_use]
    pub fn ssh_info(&self) -> Option<&SshInfo> {
        self.config.ssh_info()
    }

    /// Sets the SSH settings
    ///
    /// # Panics
    ///
    /// Panics if the engine cannot be reached through SSH.
    pub fn set_ssh_info(&mut self, info: SshInfo) {
        let engine = self.connection_type();
        match self.config.ssh_info_mut() {
            Some(slot) => *slot = info,
            None => panic!("{engine} does not support SSH tunnelling"),
        }
    }

    /// Database path of embedded engines
    #[must_use]
    pub fn db_path(&self) -> Option<&str> {
        self.config.local().map(|local| local.db_path.as_str())
    }

    /// Checks that the settings are usable for a connection attempt
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Validation`] for an empty host, port 0,
    /// an empty database path, or enabled SSH without a user.
    pub fn validate(&self) -> SettingsResult<()> {
        let invalid = |msg: &str| Err(SettingsError::Validation(format!("{}: {msg}", self.path)));

        if let Some(host) = self.host() {
            let uses_socket = matches!(
                &self.config,
                EngineConfig::Redis(cfg) | EngineConfig::Pika(cfg) if cfg.unix_socket.is_some()
            );
            if !uses_socket {
                if host.host.trim().is_empty() {
                    return invalid("host cannot be empty");
                }
                if host.port == 0 {
                    return invalid("port cannot be 0");
                }
            }
        }

        if let Some(ssh) = self.ssh_info()
            && ssh.is_enabled()
        {
            if ssh.user.trim().is_empty() {
                return invalid("SSH user cannot be empty");
            }
            if ssh.host.port == 0 {
                return invalid("SSH port cannot be 0");
            }
        }

        if let Some(local) = self.config.local()
            && local.db_path.trim().is_empty()
        {
            return invalid("database path cannot be empty");
        }

        Ok(())
    }

    /// Serializes to the positional line format
    ///
    /// `<engine>,<path>,<interval>,<separator>,<strategy>,<command line>`,
    /// followed by `,<ssh blob>` when SSH is enabled.
    #[must_use]
    pub fn to_settings_string(&self) -> String {
        self.to_string()
    }
}

impl PrepareInGui for ConnectionSettings {}

impl fmt::Display for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = SETTINGS_DELIMITER;
        write!(
            f,
            "{}{d}{}{d}{}{d}{}{d}{}{d}{}",
            self.connection_type().as_index(),
            self.path,
            self.logging_interval_ms,
            self.ns_separator,
            self.ns_display_strategy.as_index(),
            self.config.command_line(),
        )?;
        if let Some(ssh) = self.ssh_info().filter(|ssh| ssh.is_enabled()) {
            write!(f, "{d}{ssh}")?;
        }
        Ok(())
    }
}
