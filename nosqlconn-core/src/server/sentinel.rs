//! Sentinel aggregate over live server handles.

use std::sync::{Arc, Weak};

use super::{Server, ServerRef};
use crate::models::{ConnectionSettingsPath, ConnectionType};

/// Shared handle to a sentinel topology
pub type SentinelRef = Arc<Sentinel>;

/// One sentinel process and the data nodes it watches
#[derive(Debug, Clone)]
pub struct SentinelGroup {
    sentinel: Weak<Server>,
    nodes: Vec<Weak<Server>>,
}

impl SentinelGroup {
    pub(crate) fn new(sentinel: &ServerRef) -> Self {
        Self {
            sentinel: Arc::downgrade(sentinel),
            nodes: Vec::new(),
        }
    }

    pub(crate) fn add_node(&mut self, server: &ServerRef) {
        self.nodes.push(Arc::downgrade(server));
    }

    /// The sentinel server, if still alive
    #[must_use]
    pub fn sentinel(&self) -> Option<ServerRef> {
        self.sentinel.upgrade()
    }

    /// Watched nodes that are still alive
    #[must_use]
    pub fn nodes(&self) -> Vec<ServerRef> {
        self.nodes.iter().filter_map(Weak::upgrade).collect()
    }

    /// Sentinel server followed by its nodes
    pub(crate) fn all_servers(&self) -> impl Iterator<Item = ServerRef> + '_ {
        std::iter::once(&self.sentinel)
            .chain(&self.nodes)
            .filter_map(Weak::upgrade)
    }
}

/// A Redis-compatible sentinel topology
#[derive(Debug)]
pub struct Sentinel {
    path: ConnectionSettingsPath,
    engine: ConnectionType,
    groups: Vec<SentinelGroup>,
}

impl Sentinel {
    pub(crate) const fn new(path: ConnectionSettingsPath, engine: ConnectionType) -> Self {
        Self {
            path,
            engine,
            groups: Vec::new(),
        }
    }

    pub(crate) fn add_group(&mut self, group: SentinelGroup) {
        self.groups.push(group);
    }

    /// Profile path of the topology
    #[must_use]
    pub const fn path(&self) -> &ConnectionSettingsPath {
        &self.path
    }

    /// Engine of every server
    #[must_use]
    pub const fn connection_type(&self) -> ConnectionType {
        self.engine
    }

    /// Sentinel groups
    #[must_use]
    pub fn groups(&self) -> &[SentinelGroup] {
        &self.groups
    }

    /// Every live server of the topology, sentinels included
    #[must_use]
    pub fn servers(&self) -> Vec<ServerRef> {
        self.groups.iter().flat_map(SentinelGroup::all_servers).collect()
    }
}
