//! Engine adapters for connectivity probes and topology discovery.
//!
//! An adapter receives the engine configuration of a profile and performs one
//! blocking attempt against the database. Adapters own their timeouts; the
//! [`ServersManager`](crate::manager::ServersManager) never retries.

mod embedded;
mod redis;
mod resp;
mod tcp;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ConnectionType, EngineConfig, HostAndPort};

pub use embedded::EmbeddedProbeAdapter;
pub use redis::{RedisCompatAdapter, parse_cluster_nodes};
pub use resp::{RespValue, encode_command};
pub use tcp::{TcpProbeAdapter, connect_tcp};

/// Default timeout for connection tests (10 seconds)
pub const DEFAULT_TEST_TIMEOUT_SECS: u64 = 10;

/// Errors reported by engine adapters
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Connection timed out
    #[error("Connection timeout after {0} seconds")]
    Timeout(u64),

    /// Connection was refused by the remote host
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// Host is unreachable
    #[error("Host unreachable: {0}")]
    HostUnreachable(String),

    /// DNS resolution failed
    #[error("DNS resolution failed: {0}")]
    DnsResolutionFailed(String),

    /// The server answered with something unexpected
    #[error("Protocol handshake failed: {0}")]
    Protocol(String),

    /// The server rejected the credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// An embedded database does not exist and may not be created
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    /// I/O error during the probe
    #[error("IO error: {0}")]
    Io(String),

    /// The configuration cannot be probed by this adapter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The adapter does not implement the operation
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
}

/// Result type for adapter operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Role of a discovered server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerRole {
    /// Primary node
    Master,
    /// Replica node
    Slave,
    /// Sentinel process
    Sentinel,
}

/// One node reported by cluster discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDiscoveryClusterInfo {
    /// Cluster node id
    pub id: String,
    /// Client endpoint
    pub host: HostAndPort,
    /// Node role
    pub role: ServerRole,
    /// The node the discovery query was sent to
    pub is_self: bool,
    /// Link state reported as `connected`
    pub connected: bool,
}

/// One server reported by sentinel discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDiscoverySentinelInfo {
    /// Name of the monitored master group
    pub master_name: String,
    /// Client endpoint
    pub host: HostAndPort,
    /// Server role
    pub role: ServerRole,
}

/// Blocking driver for one family of engines
pub trait EngineAdapter: Send + Sync {
    /// Performs a single connectivity probe
    ///
    /// # Errors
    ///
    /// Returns the adapter-specific failure.
    fn test_connection(&self, config: &EngineConfig) -> EngineResult<()>;

    /// Lists the nodes of a live cluster
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Unsupported`] unless the adapter implements it.
    fn discover_cluster(
        &self,
        _config: &EngineConfig,
    ) -> EngineResult<Vec<ServerDiscoveryClusterInfo>> {
        Err(EngineError::Unsupported("cluster discovery"))
    }

    /// Lists the servers known to a sentinel
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Unsupported`] unless the adapter implements it.
    fn discover_sentinel(
        &self,
        _config: &EngineConfig,
    ) -> EngineResult<Vec<ServerDiscoverySentinelInfo>> {
        Err(EngineError::Unsupported("sentinel discovery"))
    }
}

/// Built-in adapters for every compiled engine
#[must_use]
pub fn default_adapters(timeout: Duration) -> Vec<(ConnectionType, Arc<dyn EngineAdapter>)> {
    let tcp: Arc<dyn EngineAdapter> = Arc::new(TcpProbeAdapter::new(timeout));
    let redis: Arc<dyn EngineAdapter> = Arc::new(RedisCompatAdapter::new(timeout));
    let embedded: Arc<dyn EngineAdapter> = Arc::new(EmbeddedProbeAdapter);

    crate::models::compiled_engines()
        .into_iter()
        .map(|engine| {
            let adapter = match engine {
                ConnectionType::Redis | ConnectionType::Pika => Arc::clone(&redis),
                ConnectionType::Memcached | ConnectionType::Ssdb => Arc::clone(&tcp),
                _ => Arc::clone(&embedded),
            };
            (engine, adapter)
        })
        .collect()
}
