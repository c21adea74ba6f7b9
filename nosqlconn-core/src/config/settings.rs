//! Application settings
//!
//! Stored as `settings.toml` in the configuration directory. Every section
//! and field is optional in the file; missing values take their defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapter::DEFAULT_TEST_TIMEOUT_SECS;
use crate::error::{ConfigError, ConfigResult};
use crate::models::{ConnectionSettings, DEFAULT_NS_SEPARATOR, NsDisplayStrategy, SETTINGS_DELIMITER};
use crate::tracing::{TracingConfig, TracingLevel};

/// Top-level application settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Logging options
    pub logging: LoggingSettings,
    /// Connection test options
    pub connection: ConnectionTestSettings,
    /// Defaults for new connection profiles
    pub defaults: ProfileDefaults,
}

/// Logging section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Root directory for per-connection history logs
    ///
    /// `~` is expanded; relative paths are resolved against the
    /// configuration directory. Unset means the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Application log level
    pub level: TracingLevel,
}

impl LoggingSettings {
    /// Tracing configuration for the application log
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig::new().with_level(self.level)
    }
}

/// Connection test section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionTestSettings {
    /// Connect and read timeout of the built-in probes, in seconds
    pub test_timeout_secs: u64,
}

impl Default for ConnectionTestSettings {
    fn default() -> Self {
        Self {
            test_timeout_secs: DEFAULT_TEST_TIMEOUT_SECS,
        }
    }
}

impl ConnectionTestSettings {
    /// Probe timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout_secs)
    }
}

/// Values applied to newly created profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDefaults {
    /// Namespace separator
    pub ns_separator: String,
    /// Namespace display strategy
    pub ns_display_strategy: NsDisplayStrategy,
    /// History logging interval, 0 disables history
    pub logging_interval_ms: u32,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            ns_separator: DEFAULT_NS_SEPARATOR.to_string(),
            ns_display_strategy: NsDisplayStrategy::FullKey,
            logging_interval_ms: 0,
        }
    }
}

impl AppSettings {
    /// Checks values the rest of the crate relies on
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a zero timeout or a namespace
    /// separator that is empty or contains the settings delimiter.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.connection.test_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "connection.test_timeout_secs must be greater than zero".to_string(),
            ));
        }
        let separator = &self.defaults.ns_separator;
        if separator.is_empty() || separator.contains(SETTINGS_DELIMITER) {
            return Err(ConfigError::Validation(format!(
                "defaults.ns_separator must be non-empty and must not contain '{SETTINGS_DELIMITER}'"
            )));
        }
        Ok(())
    }

    /// Applies the profile defaults to freshly created settings
    pub fn apply_defaults(&self, settings: &mut ConnectionSettings) {
        settings.set_ns_separator(self.defaults.ns_separator.clone());
        settings.set_ns_display_strategy(self.defaults.ns_display_strategy);
        settings.set_logging_interval_ms(self.defaults.logging_interval_ms);
    }
}
