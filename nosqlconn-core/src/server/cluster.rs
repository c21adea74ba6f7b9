//! Cluster aggregate over live server handles.

use std::sync::{Arc, Weak};

use super::{Server, ServerRef};
use crate::models::{ConnectionSettingsPath, ConnectionType};

/// Shared handle to a cluster
pub type ClusterRef = Arc<Cluster>;

/// A Redis-compatible cluster
///
/// The cluster does not own its nodes: it holds weak references into the
/// [`ServersManager`](crate::manager::ServersManager) collection, so a node
/// closed individually simply disappears from [`Cluster::servers`].
#[derive(Debug)]
pub struct Cluster {
    path: ConnectionSettingsPath,
    engine: ConnectionType,
    nodes: Vec<Weak<Server>>,
}

impl Cluster {
    pub(crate) const fn new(path: ConnectionSettingsPath, engine: ConnectionType) -> Self {
        Self {
            path,
            engine,
            nodes: Vec::new(),
        }
    }

    pub(crate) fn add_server(&mut self, server: &ServerRef) {
        self.nodes.push(Arc::downgrade(server));
    }

    /// Profile path of the cluster
    #[must_use]
    pub const fn path(&self) -> &ConnectionSettingsPath {
        &self.path
    }

    /// Engine of every node
    #[must_use]
    pub const fn connection_type(&self) -> ConnectionType {
        self.engine
    }

    /// Nodes that are still alive
    #[must_use]
    pub fn servers(&self) -> Vec<ServerRef> {
        self.nodes.iter().filter_map(Weak::upgrade).collect()
    }

    /// Number of declared nodes, including closed ones
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
