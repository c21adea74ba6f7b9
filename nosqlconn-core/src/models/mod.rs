//! Data models for connection profiles and engine configuration.

mod engine;
mod engine_config;
mod host;
mod path;
mod settings;
mod ssh;
#[cfg(feature = "extended")]
mod topology;

pub use engine::{
    ConnectionType, EngineCapabilities, EngineDescriptor, compiled_descriptor, compiled_engines,
};
pub use engine_config::{EngineConfig, LocalConfig, RedisConfig, RemoteConfig};
pub use host::HostAndPort;
pub use path::{ConnectionSettingsPath, PATH_SEPARATOR};
pub use settings::{
    ConnectionSettings, DEFAULT_NS_SEPARATOR, NsDisplayStrategy, PrepareInGui, SETTINGS_DELIMITER,
};
pub use ssh::{DEFAULT_SSH_PORT, SshAuthMethod, SshInfo};
#[cfg(feature = "extended")]
pub use topology::{ClusterSettings, SentinelGroupSettings, SentinelSettings};
