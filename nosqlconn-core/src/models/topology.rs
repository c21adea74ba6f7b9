//! Cluster and sentinel topology declarations.

use std::sync::Arc;

use super::engine::ConnectionType;
use super::path::ConnectionSettingsPath;
use super::settings::ConnectionSettings;

/// Declared cluster: a named set of node connections
#[derive(Debug, Clone)]
pub struct ClusterSettings {
    /// Profile path of the cluster
    pub path: ConnectionSettingsPath,
    /// Engine shared by every node
    pub engine: ConnectionType,
    /// Node connections
    pub nodes: Vec<Arc<ConnectionSettings>>,
}

impl ClusterSettings {
    /// Creates an empty cluster declaration
    #[must_use]
    pub fn new(path: ConnectionSettingsPath, engine: ConnectionType) -> Self {
        Self {
            path,
            engine,
            nodes: Vec::new(),
        }
    }

    /// Adds a node connection
    #[must_use]
    pub fn with_node(mut self, node: impl Into<Arc<ConnectionSettings>>) -> Self {
        self.nodes.push(node.into());
        self
    }
}

/// One monitored group: a sentinel server and the data nodes it watches
#[derive(Debug, Clone)]
pub struct SentinelGroupSettings {
    /// The sentinel process itself
    pub sentinel: Arc<ConnectionSettings>,
    /// Master and replica nodes watched by the sentinel
    pub nodes: Vec<Arc<ConnectionSettings>>,
}

impl SentinelGroupSettings {
    /// Creates a group without nodes
    #[must_use]
    pub fn new(sentinel: impl Into<Arc<ConnectionSettings>>) -> Self {
        Self {
            sentinel: sentinel.into(),
            nodes: Vec::new(),
        }
    }

    /// Adds a watched node
    #[must_use]
    pub fn with_node(mut self, node: impl Into<Arc<ConnectionSettings>>) -> Self {
        self.nodes.push(node.into());
        self
    }
}

/// Declared sentinel topology
#[derive(Debug, Clone)]
pub struct SentinelSettings {
    /// Profile path of the sentinel topology
    pub path: ConnectionSettingsPath,
    /// Engine shared by every server
    pub engine: ConnectionType,
    /// Sentinel groups
    pub sentinels: Vec<SentinelGroupSettings>,
}

impl SentinelSettings {
    /// Creates an empty sentinel declaration
    #[must_use]
    pub fn new(path: ConnectionSettingsPath, engine: ConnectionType) -> Self {
        Self {
            path,
            engine,
            sentinels: Vec::new(),
        }
    }

    /// Adds a sentinel group
    #[must_use]
    pub fn with_group(mut self, group: SentinelGroupSettings) -> Self {
        self.sentinels.push(group);
        self
    }
}
