//! Database engine identifiers and the engine capability registry.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::engine_config::{EngineConfig, LocalConfig, RedisConfig, RemoteConfig};

/// Database engine a connection talks to
///
/// The discriminant is the single digit used by the serialized settings
/// line, so the order of variants is part of the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// Redis server
    Redis = 0,
    /// Memcached server
    Memcached = 1,
    /// SSDB server
    Ssdb = 2,
    /// LevelDB database directory
    LevelDb = 3,
    /// RocksDB database directory
    RocksDb = 4,
    /// UnQLite database file
    UnQLite = 5,
    /// LMDB environment
    Lmdb = 6,
    /// UpscaleDB database file
    UpscaleDb = 7,
    /// ForestDB database file
    ForestDb = 8,
    /// Pika server (Redis protocol compatible)
    Pika = 9,
}

impl ConnectionType {
    /// Every engine known to the application, in serialization order
    pub const ALL: [Self; 10] = [
        Self::Redis,
        Self::Memcached,
        Self::Ssdb,
        Self::LevelDb,
        Self::RocksDb,
        Self::UnQLite,
        Self::Lmdb,
        Self::UpscaleDb,
        Self::ForestDb,
        Self::Pika,
    ];

    /// Returns the digit used in serialized settings
    #[must_use]
    pub const fn as_index(self) -> u8 {
        self as u8
    }

    /// Looks up an engine by its serialized digit
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Returns the lowercase identifier used for feature names and config files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::Memcached => "memcached",
            Self::Ssdb => "ssdb",
            Self::LevelDb => "leveldb",
            Self::RocksDb => "rocksdb",
            Self::UnQLite => "unqlite",
            Self::Lmdb => "lmdb",
            Self::UpscaleDb => "upscaledb",
            Self::ForestDb => "forestdb",
            Self::Pika => "pika",
        }
    }

    /// Returns true if support for this engine is compiled into the build
    #[must_use]
    pub const fn is_compiled(self) -> bool {
        match self {
            Self::Redis => cfg!(feature = "redis"),
            Self::Memcached => cfg!(feature = "memcached"),
            Self::Ssdb => cfg!(feature = "ssdb"),
            Self::LevelDb => cfg!(feature = "leveldb"),
            Self::RocksDb => cfg!(feature = "rocksdb"),
            Self::UnQLite => cfg!(feature = "unqlite"),
            Self::Lmdb => cfg!(feature = "lmdb"),
            Self::UpscaleDb => cfg!(feature = "upscaledb"),
            Self::ForestDb => cfg!(feature = "forestdb"),
            Self::Pika => cfg!(feature = "pika"),
        }
    }

    /// Returns the registry entry for this engine regardless of build features
    #[must_use]
    pub fn descriptor(self) -> &'static EngineDescriptor {
        &ENGINES[self as usize]
    }

    /// Returns true if the engine is compiled in and talks to a network server
    #[must_use]
    pub fn is_remote(self) -> bool {
        compiled_descriptor(self).is_some_and(|d| d.capabilities.remote)
    }

    /// Returns true if the engine is compiled in and can be reached through an SSH tunnel
    #[must_use]
    pub fn is_can_ssh_connection(self) -> bool {
        compiled_descriptor(self).is_some_and(|d| d.capabilities.ssh)
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().display_name)
    }
}

impl std::str::FromStr for ConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|engine| engine.as_str() == lower)
            .ok_or_else(|| format!("unknown engine '{s}'"))
    }
}

/// Capability flags of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct EngineCapabilities {
    /// Connects to a network server (host/port)
    pub remote: bool,
    /// Supports SSH tunnelling
    pub ssh: bool,
    /// Supports cluster aggregates
    pub cluster: bool,
    /// Supports sentinel aggregates
    pub sentinel: bool,
    /// Supports live topology discovery
    pub discovery: bool,
}

const LOCAL: EngineCapabilities = EngineCapabilities {
    remote: false,
    ssh: false,
    cluster: false,
    sentinel: false,
    discovery: false,
};

const REMOTE: EngineCapabilities = EngineCapabilities {
    remote: true,
    ..LOCAL
};

const REDIS_COMPATIBLE: EngineCapabilities = EngineCapabilities {
    remote: true,
    ssh: true,
    cluster: true,
    sentinel: true,
    discovery: true,
};

/// Registry entry describing one engine
#[derive(Debug)]
pub struct EngineDescriptor {
    /// Engine this entry describes
    pub engine: ConnectionType,
    /// Human-readable engine name
    pub display_name: &'static str,
    /// Extension of the per-connection history log file
    pub log_extension: &'static str,
    /// Capability flags
    pub capabilities: EngineCapabilities,
    /// Builds the default engine configuration for a fresh profile
    pub default_config: fn() -> EngineConfig,
}

fn default_redis() -> EngineConfig {
    EngineConfig::Redis(RedisConfig::with_port(6379))
}

fn default_memcached() -> EngineConfig {
    EngineConfig::Memcached(RemoteConfig::with_port(11211))
}

fn default_ssdb() -> EngineConfig {
    EngineConfig::Ssdb(RemoteConfig::with_port(8888))
}

fn default_leveldb() -> EngineConfig {
    EngineConfig::LevelDb(LocalConfig::new("~/test.leveldb"))
}

fn default_rocksdb() -> EngineConfig {
    EngineConfig::RocksDb(LocalConfig::new("~/test.rocksdb"))
}

fn default_unqlite() -> EngineConfig {
    EngineConfig::UnQLite(LocalConfig::new("~/test.unq"))
}

fn default_lmdb() -> EngineConfig {
    EngineConfig::Lmdb(LocalConfig::new("~/test.lmdb"))
}

fn default_upscaledb() -> EngineConfig {
    EngineConfig::UpscaleDb(LocalConfig::new("~/test.upscaledb"))
}

fn default_forestdb() -> EngineConfig {
    EngineConfig::ForestDb(LocalConfig::new("~/test.forestdb"))
}

fn default_pika() -> EngineConfig {
    EngineConfig::Pika(RedisConfig::with_port(9221))
}

static ENGINES: [EngineDescriptor; 10] = [
    EngineDescriptor {
        engine: ConnectionType::Redis,
        display_name: "Redis",
        log_extension: ".red",
        capabilities: REDIS_COMPATIBLE,
        default_config: default_redis,
    },
    EngineDescriptor {
        engine: ConnectionType::Memcached,
        display_name: "Memcached",
        log_extension: ".mem",
        capabilities: REMOTE,
        default_config: default_memcached,
    },
    EngineDescriptor {
        engine: ConnectionType::Ssdb,
        display_name: "SSDB",
        log_extension: ".ssdb",
        capabilities: REMOTE,
        default_config: default_ssdb,
    },
    EngineDescriptor {
        engine: ConnectionType::LevelDb,
        display_name: "LevelDB",
        log_extension: ".leveldb",
        capabilities: LOCAL,
        default_config: default_leveldb,
    },
    EngineDescriptor {
        engine: ConnectionType::RocksDb,
        display_name: "RocksDB",
        log_extension: ".rocksdb",
        capabilities: LOCAL,
        default_config: default_rocksdb,
    },
    EngineDescriptor {
        engine: ConnectionType::UnQLite,
        display_name: "UnQLite",
        log_extension: ".unq",
        capabilities: LOCAL,
        default_config: default_unqlite,
    },
    EngineDescriptor {
        engine: ConnectionType::Lmdb,
        display_name: "LMDB",
        log_extension: ".lmdb",
        capabilities: LOCAL,
        default_config: default_lmdb,
    },
    EngineDescriptor {
        engine: ConnectionType::UpscaleDb,
        display_name: "UpscaleDB",
        log_extension: ".upscaledb",
        capabilities: LOCAL,
        default_config: default_upscaledb,
    },
    EngineDescriptor {
        engine: ConnectionType::ForestDb,
        display_name: "ForestDB",
        log_extension: ".forestdb",
        capabilities: LOCAL,
        default_config: default_forestdb,
    },
    EngineDescriptor {
        engine: ConnectionType::Pika,
        display_name: "Pika",
        log_extension: ".pika",
        capabilities: REDIS_COMPATIBLE,
        default_config: default_pika,
    },
];

/// Returns the registry entry for an engine if it is compiled into the build
#[must_use]
pub fn compiled_descriptor(engine: ConnectionType) -> Option<&'static EngineDescriptor> {
    engine.is_compiled().then(|| engine.descriptor())
}

/// Returns every engine compiled into the build, in serialization order
#[must_use]
pub fn compiled_engines() -> Vec<ConnectionType> {
    ConnectionType::ALL
        .into_iter()
        .filter(|engine| engine.is_compiled())
        .collect()
}
