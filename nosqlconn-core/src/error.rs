//! Error types for `NoSQLConn`
//!
//! Recoverable failures are reported through the enums in this module.
//! Contract violations (dispatching an engine that is not compiled in,
//! building a cluster for an engine without cluster support, ...) are
//! programming faults and panic instead; see the `# Panics` sections of the
//! factory and manager APIs.

use std::path::PathBuf;

use thiserror::Error;

use crate::adapter::EngineError;
use crate::models::{ConnectionSettingsPath, ConnectionType};

/// Errors produced while building or decoding connection settings
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// The engine field of a serialized line is not a known engine digit
    #[error("Invalid engine tag: '{0}'")]
    InvalidEngineTag(String),

    /// The engine is known but not compiled into this build
    #[error("Engine {0} is not compiled into this build")]
    EngineNotCompiled(ConnectionType),

    /// The serialized line ended before the command-line payload
    #[error("Serialized settings are truncated after {fields} field(s)")]
    Truncated {
        /// Number of fields that were decoded before the input ended
        fields: usize,
    },

    /// The engine command-line payload could not be parsed
    #[error("Invalid command line for {engine}: {reason}")]
    InvalidCommandLine {
        /// Engine the payload was parsed for
        engine: ConnectionType,
        /// Why the payload was rejected
        reason: String,
    },

    /// The SSH blob could not be parsed
    #[error("Invalid SSH info: {0}")]
    InvalidSshInfo(String),

    /// A host/port pair could not be parsed
    #[error("Invalid host address: '{0}'")]
    InvalidHost(String),

    /// The settings are syntactically valid but unusable
    #[error("Invalid settings: {0}")]
    Validation(String),
}

/// Result type for settings operations
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Errors returned by [`ServersManager`](crate::manager::ServersManager) operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServerError {
    /// The settings passed to the operation are not usable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine is not compiled in or has no adapter registered
    #[error("Unsupported connection type: {0}")]
    UnsupportedType(ConnectionType),

    /// The engine does not provide the requested capability
    #[error("Not supported setting type: {operation} is not available for {engine}")]
    NotSupported {
        /// Engine the operation was requested for
        engine: ConnectionType,
        /// Operation name
        operation: &'static str,
    },

    /// The engine adapter reported a failure
    #[error(transparent)]
    Adapter(#[from] EngineError),
}

/// Result type for server operations
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Errors related to configuration files
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No usable configuration directory could be determined
    #[error("Configuration directory not found")]
    NoConfigDir,

    /// Failed to parse a configuration file
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    Validation(String),

    /// I/O error while reading or writing configuration
    #[error("IO error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors returned by the profile store
#[derive(Debug, Error)]
pub enum StoreError {
    /// A profile with this path already exists
    #[error("Connection already exists: {0}")]
    Duplicate(ConnectionSettingsPath),

    /// No profile with this path exists
    #[error("Connection not found: {0}")]
    NotFound(ConnectionSettingsPath),

    /// I/O error while loading or saving profiles
    #[error("IO error on {path}: {source}")]
    Io {
        /// Profile file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Result type for profile store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Top-level error type aggregating every module error
#[derive(Debug, Error)]
pub enum NosqlConnError {
    /// Settings error
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Server error
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Profile store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Tracing setup error
    #[error(transparent)]
    Tracing(#[from] crate::tracing::TracingError),
}
