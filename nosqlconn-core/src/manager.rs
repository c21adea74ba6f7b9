//! Server lifecycle and adapter dispatch.
//!
//! [`ServersManager`] turns settings into live server handles, owns those
//! handles until they are closed, and routes connectivity tests and topology
//! discovery to the adapter registered for each engine.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::adapter::{DEFAULT_TEST_TIMEOUT_SECS, EngineAdapter, default_adapters};
use crate::error::{ServerError, ServerResult};
use crate::models::{ConnectionSettings, ConnectionType};
use crate::server::{Server, ServerRef};

#[cfg(feature = "extended")]
use crate::adapter::{ServerDiscoveryClusterInfo, ServerDiscoverySentinelInfo};
#[cfg(feature = "extended")]
use crate::models::{ClusterSettings, SentinelSettings, compiled_descriptor};
#[cfg(feature = "extended")]
use crate::server::{Cluster, ClusterRef, Sentinel, SentinelGroup, SentinelRef};

/// Owner of the live server handles
pub struct ServersManager {
    servers: Vec<ServerRef>,
    adapters: HashMap<ConnectionType, Arc<dyn EngineAdapter>>,
    timeout: Duration,
}

impl ServersManager {
    /// Creates a manager with the built-in adapters and the default timeout
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TEST_TIMEOUT_SECS))
    }

    /// Creates a manager whose built-in adapters use `timeout`
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            servers: Vec::new(),
            adapters: default_adapters(timeout).into_iter().collect(),
            timeout,
        }
    }

    /// Probe timeout of the built-in adapters
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Replaces the adapter used for `engine`, returning the previous one
    pub fn register_adapter(
        &mut self,
        engine: ConnectionType,
        adapter: Arc<dyn EngineAdapter>,
    ) -> Option<Arc<dyn EngineAdapter>> {
        self.adapters.insert(engine, adapter)
    }

    /// Creates a server handle and registers it
    ///
    /// # Panics
    ///
    /// Panics if the engine of `settings` is not compiled into this build.
    pub fn create_server(&mut self, settings: Arc<ConnectionSettings>) -> ServerRef {
        let engine = settings.connection_type();
        assert!(
            engine.is_compiled(),
            "cannot create a server for {engine}: engine is not compiled in"
        );

        let server = Arc::new(Server::new(settings));
        debug!(engine = %engine, server = %server, id = %server.id(), "Server created");
        self.servers.push(Arc::clone(&server));
        server
    }

    /// Creates one server per declared node and groups them in a cluster
    ///
    /// # Panics
    ///
    /// Panics if the engine does not support clusters (anything but Redis
    /// and Pika) or is not compiled in.
    #[cfg(feature = "extended")]
    pub fn create_cluster(&mut self, settings: &ClusterSettings) -> ClusterRef {
        let engine = settings.engine;
        assert!(
            compiled_descriptor(engine).is_some_and(|d| d.capabilities.cluster),
            "cannot create a cluster for {engine}: cluster mode is not supported"
        );

        let mut cluster = Cluster::new(settings.path.clone(), engine);
        for node in &settings.nodes {
            let server = self.create_server(Arc::clone(node));
            cluster.add_server(&server);
        }
        info!(path = %settings.path, nodes = cluster.node_count(), "Cluster created");
        Arc::new(cluster)
    }

    /// Creates every sentinel and node server of a sentinel topology
    ///
    /// # Panics
    ///
    /// Panics if the engine does not support sentinels (anything but Redis
    /// and Pika) or is not compiled in.
    #[cfg(feature = "extended")]
    pub fn create_sentinel(&mut self, settings: &SentinelSettings) -> SentinelRef {
        let engine = settings.engine;
        assert!(
            compiled_descriptor(engine).is_some_and(|d| d.capabilities.sentinel),
            "cannot create a sentinel for {engine}: sentinel mode is not supported"
        );

        let mut sentinel = Sentinel::new(settings.path.clone(), engine);
        for declared in &settings.sentinels {
            let sentinel_server = self.create_server(Arc::clone(&declared.sentinel));
            let mut group = SentinelGroup::new(&sentinel_server);
            for node in &declared.nodes {
                let server = self.create_server(Arc::clone(node));
                group.add_node(&server);
            }
            sentinel.add_group(group);
        }
        info!(path = %settings.path, groups = sentinel.groups().len(), "Sentinel created");
        Arc::new(sentinel)
    }

    fn adapter_for(&self, settings: &ConnectionSettings) -> ServerResult<&Arc<dyn EngineAdapter>> {
        settings
            .validate()
            .map_err(|e| ServerError::InvalidArgument(e.to_string()))?;

        let engine = settings.connection_type();
        if !engine.is_compiled() {
            return Err(ServerError::UnsupportedType(engine));
        }
        self.adapters
            .get(&engine)
            .ok_or(ServerError::UnsupportedType(engine))
    }

    /// Runs one connectivity probe for `settings`
    ///
    /// # Errors
    ///
    /// * [`ServerError::InvalidArgument`] if the settings fail validation
    /// * [`ServerError::UnsupportedType`] if the engine is not compiled in or
    ///   has no adapter
    /// * [`ServerError::Adapter`] with the adapter's own failure
    pub fn test_connection(&self, settings: &ConnectionSettings) -> ServerResult<()> {
        let adapter = self.adapter_for(settings)?;
        let result = adapter.test_connection(settings.config());

        match &result {
            Ok(()) => info!(
                engine = %settings.connection_type(),
                path = %settings.path(),
                success = true,
                "Connection test finished"
            ),
            Err(e) => warn!(
                engine = %settings.connection_type(),
                path = %settings.path(),
                success = false,
                error = %e,
                "Connection test failed"
            ),
        }
        result.map_err(ServerError::from)
    }

    #[cfg(feature = "extended")]
    fn discovery_adapter(
        &self,
        settings: &ConnectionSettings,
        operation: &'static str,
    ) -> ServerResult<&Arc<dyn EngineAdapter>> {
        let engine = settings.connection_type();
        if !engine.descriptor().capabilities.discovery {
            return Err(ServerError::NotSupported { engine, operation });
        }
        self.adapter_for(settings)
    }

    /// Lists the nodes of the cluster `settings` points at
    ///
    /// # Errors
    ///
    /// [`ServerError::NotSupported`] for engines without discovery, whatever
    /// the settings hold. Otherwise as [`test_connection`](Self::test_connection).
    #[cfg(feature = "extended")]
    pub fn discovery_cluster_connection(
        &self,
        settings: &ConnectionSettings,
    ) -> ServerResult<Vec<ServerDiscoveryClusterInfo>> {
        let adapter = self.discovery_adapter(settings, "cluster discovery")?;
        let nodes = adapter.discover_cluster(settings.config())?;
        info!(path = %settings.path(), nodes = nodes.len(), "Cluster discovery finished");
        Ok(nodes)
    }

    /// Lists the servers known to the sentinel `settings` points at
    ///
    /// # Errors
    ///
    /// [`ServerError::NotSupported`] for engines without discovery, whatever
    /// the settings hold. Otherwise as [`test_connection`](Self::test_connection).
    #[cfg(feature = "extended")]
    pub fn discovery_sentinel_connection(
        &self,
        settings: &ConnectionSettings,
    ) -> ServerResult<Vec<ServerDiscoverySentinelInfo>> {
        let adapter = self.discovery_adapter(settings, "sentinel discovery")?;
        let servers = adapter.discover_sentinel(settings.config())?;
        info!(path = %settings.path(), servers = servers.len(), "Sentinel discovery finished");
        Ok(servers)
    }

    /// Drops every live handle without closing them one by one
    pub fn clear(&mut self) {
        debug!(count = self.servers.len(), "Clearing servers");
        self.servers.clear();
    }

    /// Removes one handle; returns false if it was not registered
    pub fn close_server(&mut self, server: &ServerRef) -> bool {
        let Some(pos) = self.servers.iter().position(|s| Arc::ptr_eq(s, server)) else {
            return false;
        };
        self.servers.remove(pos);
        debug!(server = %server, "Server closed");
        true
    }

    /// Closes every server of a cluster; returns how many were registered
    #[cfg(feature = "extended")]
    pub fn close_cluster(&mut self, cluster: &Cluster) -> usize {
        cluster
            .servers()
            .iter()
            .filter(|server| self.close_server(server))
            .count()
    }

    /// Closes every sentinel and node server; returns how many were registered
    #[cfg(feature = "extended")]
    pub fn close_sentinel(&mut self, sentinel: &Sentinel) -> usize {
        sentinel
            .servers()
            .iter()
            .filter(|server| self.close_server(server))
            .count()
    }

    /// Live handles in creation order
    #[must_use]
    pub fn servers(&self) -> &[ServerRef] {
        &self.servers
    }

    /// Number of live handles
    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Returns true if no handle is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Returns true if `server` is registered (not yet closed)
    #[must_use]
    pub fn contains(&self, server: &ServerRef) -> bool {
        self.servers.iter().any(|s| Arc::ptr_eq(s, server))
    }
}

impl Default for ServersManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServersManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut engines: Vec<_> = self.adapters.keys().copied().collect();
        engines.sort();
        f.debug_struct("ServersManager")
            .field("servers", &self.servers.len())
            .field("adapters", &engines)
            .field("timeout", &self.timeout)
            .finish()
    }
}
