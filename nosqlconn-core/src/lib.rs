//! `NoSQLConn` Core Library
//!
//! This crate provides the connection-settings and server-lifecycle core of
//! the `NoSQLConn` database client: typed connection profiles for every
//! supported engine, their compact one-line serialization, and the manager
//! that turns profiles into live server, cluster and sentinel handles.
//!
//! # Crate Structure
//!
//! - [`models`] - Profile paths, engine registry, per-engine configs, settings
//! - [`factory`] - `ConnectionSettingsFactory` (engine tag / text → settings)
//! - [`manager`] - `ServersManager` (settings → live handles, tests, discovery)
//! - [`server`] - Server handles and the cluster / sentinel aggregates
//! - [`adapter`] - Blocking probes for Redis-compatible, TCP and embedded engines
//! - [`store`] - Connection profile container and its line-per-profile file
//! - [`config`] - Application settings and configuration directory
//!
//! # Feature Flags
//!
//! - `redis`, `memcached`, `ssdb`, `leveldb`, `rocksdb`, `unqlite`, `lmdb`,
//!   `upscaledb`, `forestdb`, `pika` - compile the engine in (all default)
//! - `extended` - cluster and sentinel topologies, topology discovery (default)

#![warn(missing_docs)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod factory;
pub mod hash;
pub mod manager;
pub mod models;
pub mod server;
pub mod store;
pub mod tracing;

pub use adapter::{
    DEFAULT_TEST_TIMEOUT_SECS, EmbeddedProbeAdapter, EngineAdapter, EngineError, EngineResult,
    RedisCompatAdapter, ServerDiscoveryClusterInfo, ServerDiscoverySentinelInfo, ServerRole,
    TcpProbeAdapter,
};
pub use config::{AppSettings, ConfigManager};
pub use error::{
    ConfigError, ConfigResult, NosqlConnError, ServerError, ServerResult, SettingsError,
    SettingsResult, StoreError, StoreResult,
};
pub use factory::ConnectionSettingsFactory;
pub use hash::crc64;
pub use manager::ServersManager;
#[cfg(feature = "extended")]
pub use models::{ClusterSettings, SentinelGroupSettings, SentinelSettings};
pub use models::{
    ConnectionSettings, ConnectionSettingsPath, ConnectionType, EngineConfig, HostAndPort,
    LocalConfig, NsDisplayStrategy, RedisConfig, RemoteConfig, SshAuthMethod, SshInfo,
};
#[cfg(feature = "extended")]
pub use server::{Cluster, ClusterRef, Sentinel, SentinelGroup, SentinelRef};
pub use server::{Server, ServerKind, ServerRef};
pub use store::{ProfileStore, SkipReason, SkippedLine};
pub use tracing::{TracingConfig, TracingError, TracingLevel, TracingOutput, init_tracing};
