//! Live server handles and the topology aggregates built from them.

#[cfg(feature = "extended")]
mod cluster;
#[cfg(feature = "extended")]
mod sentinel;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::adapter::EmbeddedProbeAdapter;
use crate::models::{ConnectionSettings, ConnectionType, HostAndPort};

#[cfg(feature = "extended")]
pub use cluster::{Cluster, ClusterRef};
#[cfg(feature = "extended")]
pub use sentinel::{Sentinel, SentinelGroup, SentinelRef};

/// Shared handle to a live server
pub type ServerRef = Arc<Server>;

/// Where a server lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerKind {
    /// Network server
    Remote(HostAndPort),
    /// Embedded database at a resolved path
    Embedded(PathBuf),
}

/// Runtime handle for one engine instance
///
/// A server keeps the settings it was created with; later edits to the
/// profile do not affect it.
#[derive(Debug)]
pub struct Server {
    id: Uuid,
    settings: Arc<ConnectionSettings>,
    kind: ServerKind,
    created_at: DateTime<Utc>,
}

impl Server {
    pub(crate) fn new(settings: Arc<ConnectionSettings>) -> Self {
        let kind = match (settings.host(), settings.db_path()) {
            (Some(host), _) => ServerKind::Remote(host.clone()),
            (None, Some(path)) => ServerKind::Embedded(EmbeddedProbeAdapter::resolve_path(path)),
            (None, None) => ServerKind::Embedded(PathBuf::new()),
        };

        Self {
            id: Uuid::new_v4(),
            settings,
            kind,
            created_at: Utc::now(),
        }
    }

    /// Unique handle id
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Settings the server was created from
    #[must_use]
    pub fn settings(&self) -> &Arc<ConnectionSettings> {
        &self.settings
    }

    /// Engine of the server
    #[must_use]
    pub fn connection_type(&self) -> ConnectionType {
        self.settings.connection_type()
    }

    /// Connection name (last path segment)
    #[must_use]
    pub fn name(&self) -> &str {
        self.settings.path().name()
    }

    /// Location of the server
    #[must_use]
    pub const fn kind(&self) -> &ServerKind {
        &self.kind
    }

    /// Creation time of the handle
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ServerKind::Remote(host) => write!(f, "{} ({host})", self.settings.path()),
            ServerKind::Embedded(path) => {
                write!(f, "{} ({})", self.settings.path(), path.display())
            }
        }
    }
}
