//! Engine-specific connection payloads and their command-line encoding.
//!
//! Every engine stores its connection parameters as a short command line
//! (`-h 127.0.0.1 -p 6379`, `-f ~/test.leveldb -c`, ...). Only flags whose
//! value differs from the default are rendered, except the address flags
//! (`-h`/`-p` and `-f`) which are always present.

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

use super::engine::ConnectionType;
use super::host::HostAndPort;
use super::ssh::{SshInfo, secret_eq};
use crate::error::{SettingsError, SettingsResult};

/// Redis protocol configuration (also used by Pika)
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Server endpoint
    pub host: HostAndPort,
    /// Unix domain socket, preferred over `host` when set
    pub unix_socket: Option<PathBuf>,
    /// `AUTH` password
    pub password: Option<SecretString>,
    /// Logical database selected after connecting
    pub db_num: u32,
    /// SSH tunnel; not part of the command line
    pub ssh: SshInfo,
}

impl RedisConfig {
    /// Loopback configuration on the given port
    #[must_use]
    pub fn with_port(port: u16) -> Self {
        Self {
            host: HostAndPort::localhost(port),
            unix_socket: None,
            password: None,
            db_num: 0,
            ssh: SshInfo::default(),
        }
    }
}

impl PartialEq for RedisConfig {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host
            && self.unix_socket == other.unix_socket
            && secret_eq(self.password.as_ref(), other.password.as_ref())
            && self.db_num == other.db_num
            && self.ssh == other.ssh
    }
}

impl Eq for RedisConfig {}

/// Plain remote server configuration (Memcached, SSDB)
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Server endpoint
    pub host: HostAndPort,
    /// Login user (SASL for Memcached)
    pub user: Option<String>,
    /// Login password
    pub password: Option<SecretString>,
}

impl RemoteConfig {
    /// Loopback configuration on the given port
    #[must_use]
    pub fn with_port(port: u16) -> Self {
        Self {
            host: HostAndPort::localhost(port),
            user: None,
            password: None,
        }
    }
}

impl PartialEq for RemoteConfig {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host
            && self.user == other.user
            && secret_eq(self.password.as_ref(), other.password.as_ref())
    }
}

impl Eq for RemoteConfig {}

/// Embedded database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    /// Database file or directory, `~` is expanded when opened
    pub db_path: String,
    /// Create the database if it does not exist
    pub create_if_missing: bool,
    /// Open without write access
    pub read_only: bool,
    /// Named sub-database (LMDB, ForestDB)
    pub db_name: Option<String>,
}

impl LocalConfig {
    /// Creates a configuration for the given database path
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            create_if_missing: false,
            read_only: false,
            db_name: None,
        }
    }

    /// Sets the create-if-missing flag
    #[must_use]
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Sets the read-only flag
    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// Engine-specific configuration
///
/// The variant fixes the engine of a settings object for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineConfig {
    /// Redis
    Redis(RedisConfig),
    /// Memcached
    Memcached(RemoteConfig),
    /// SSDB
    Ssdb(RemoteConfig),
    /// LevelDB
    LevelDb(LocalConfig),
    /// RocksDB
    RocksDb(LocalConfig),
    /// UnQLite
    UnQLite(LocalConfig),
    /// LMDB
    Lmdb(LocalConfig),
    /// UpscaleDB
    UpscaleDb(LocalConfig),
    /// ForestDB
    ForestDb(LocalConfig),
    /// Pika (reuses the Redis configuration)
    Pika(RedisConfig),
}

impl EngineConfig {
    /// Returns the engine this configuration belongs to
    #[must_use]
    pub const fn connection_type(&self) -> ConnectionType {
        match self {
            Self::Redis(_) => ConnectionType::Redis,
            Self::Memcached(_) => ConnectionType::Memcached,
            Self::Ssdb(_) => ConnectionType::Ssdb,
            Self::LevelDb(_) => ConnectionType::LevelDb,
            Self::RocksDb(_) => ConnectionType::RocksDb,
            Self::UnQLite(_) => ConnectionType::UnQLite,
            Self::Lmdb(_) => ConnectionType::Lmdb,
            Self::UpscaleDb(_) => ConnectionType::UpscaleDb,
            Self::ForestDb(_) => ConnectionType::ForestDb,
            Self::Pika(_) => ConnectionType::Pika,
        }
    }

    /// Returns the default configuration of an engine
    #[must_use]
    pub fn default_for(engine: ConnectionType) -> Self {
        (engine.descriptor().default_config)()
    }

    /// Renders the command-line form of this configuration
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut args = CommandLine::default();
        match self {
            Self::Redis(cfg) | Self::Pika(cfg) => {
                args.pair("-h", &cfg.host.host);
                args.pair("-p", &cfg.host.port.to_string());
                if let Some(socket) = &cfg.unix_socket {
                    args.pair("-s", &socket.to_string_lossy());
                }
                if let Some(password) = &cfg.password {
                    args.pair("-a", password.expose_secret());
                }
                if cfg.db_num != 0 {
                    args.pair("-n", &cfg.db_num.to_string());
                }
            }
            Self::Memcached(cfg) | Self::Ssdb(cfg) => {
                args.pair("-h", &cfg.host.host);
                args.pair("-p", &cfg.host.port.to_string());
                if let Some(user) = &cfg.user {
                    args.pair("-u", user);
                }
                if let Some(password) = &cfg.password {
                    args.pair("-a", password.expose_secret());
                }
            }
            Self::LevelDb(cfg)
            | Self::RocksDb(cfg)
            | Self::UnQLite(cfg)
            | Self::Lmdb(cfg)
            | Self::UpscaleDb(cfg)
            | Self::ForestDb(cfg) => {
                args.pair("-f", &cfg.db_path);
                if cfg.create_if_missing {
                    args.flag("-c");
                }
                if cfg.read_only {
                    args.flag("-r");
                }
                if let Some(name) = &cfg.db_name {
                    args.pair("-n", name);
                }
            }
        }
        args.finish()
    }

    /// Replaces the command-line part of this configuration
    ///
    /// Flags absent from `text` take the engine defaults. The SSH settings of
    /// Redis-compatible engines are not part of the command line and are kept.
    /// On error the configuration is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidCommandLine`] for unknown flags,
    /// missing values, unbalanced quotes or malformed numbers.
    pub fn set_command_line(&mut self, text: &str) -> SettingsResult<()> {
        let engine = self.connection_type();
        let invalid = |reason: String| SettingsError::InvalidCommandLine { engine, reason };

        let tokens = tokenize(text).map_err(invalid)?;
        let mut fresh = Self::default_for(engine);
        let mut iter = tokens.into_iter();

        while let Some(flag) = iter.next() {
            let mut value = || {
                iter.next()
                    .ok_or_else(|| invalid(format!("missing value for '{flag}'")))
            };

            match (&mut fresh, flag.as_str()) {
                (Self::Redis(cfg) | Self::Pika(cfg), "-h") => cfg.host.host = value()?,
                (Self::Redis(cfg) | Self::Pika(cfg), "-p") => {
                    cfg.host.port = parse_port(&value()?).map_err(invalid)?;
                }
                (Self::Redis(cfg) | Self::Pika(cfg), "-s") => {
                    cfg.unix_socket = Some(PathBuf::from(value()?));
                }
                (Self::Redis(cfg) | Self::Pika(cfg), "-a") => {
                    cfg.password = Some(SecretString::from(value()?));
                }
                (Self::Redis(cfg) | Self::Pika(cfg), "-n") => {
                    let raw = value()?;
                    cfg.db_num = raw
                        .parse()
                        .map_err(|_| invalid(format!("invalid database number '{raw}'")))?;
                }
                (Self::Memcached(cfg) | Self::Ssdb(cfg), "-h") => cfg.host.host = value()?,
                (Self::Memcached(cfg) | Self::Ssdb(cfg), "-p") => {
                    cfg.host.port = parse_port(&value()?).map_err(invalid)?;
                }
                (Self::Memcached(cfg) | Self::Ssdb(cfg), "-u") => cfg.user = Some(value()?),
                (Self::Memcached(cfg) | Self::Ssdb(cfg), "-a") => {
                    cfg.password = Some(SecretString::from(value()?));
                }
                (fresh, flag) => match (fresh.local_mut(), flag) {
                    (Some(cfg), "-f") => cfg.db_path = value()?,
                    (Some(cfg), "-c") => cfg.create_if_missing = true,
                    (Some(cfg), "-r") => cfg.read_only = true,
                    (Some(cfg), "-n") => cfg.db_name = Some(value()?),
                    _ => return Err(invalid(format!("unknown flag '{flag}'"))),
                },
            }
        }

        if let (Self::Redis(old) | Self::Pika(old), Self::Redis(new) | Self::Pika(new)) =
            (&mut *self, &mut fresh)
        {
            new.ssh = std::mem::take(&mut old.ssh);
        }
        *self = fresh;
        Ok(())
    }

    /// Returns the network endpoint of remote engines
    #[must_use]
    pub fn host(&self) -> Option<&HostAndPort> {
        match self {
            Self::Redis(cfg) | Self::Pika(cfg) => Some(&cfg.host),
            Self::Memcached(cfg) | Self::Ssdb(cfg) => Some(&cfg.host),
            _ => None,
        }
    }

    /// Mutable access to the network endpoint of remote engines
    pub fn host_mut(&mut self) -> Option<&mut HostAndPort> {
        match self {
            Self::Redis(cfg) | Self::Pika(cfg) => Some(&mut cfg.host),
            Self::Memcached(cfg) | Self::Ssdb(cfg) => Some(&mut cfg.host),
            _ => None,
        }
    }

    /// Returns the SSH settings of Redis-compatible engines
    #[must_use]
    pub fn ssh_info(&self) -> Option<&SshInfo> {
        match self {
            Self::Redis(cfg) | Self::Pika(cfg) => Some(&cfg.ssh),
            _ => None,
        }
    }

    /// Mutable access to the SSH settings of Redis-compatible engines
    pub fn ssh_info_mut(&mut self) -> Option<&mut SshInfo> {
        match self {
            Self::Redis(cfg) | Self::Pika(cfg) => Some(&mut cfg.ssh),
            _ => None,
        }
    }

    /// Returns the configuration of embedded engines
    #[must_use]
    pub fn local(&self) -> Option<&LocalConfig> {
        match self {
            Self::LevelDb(cfg)
            | Self::RocksDb(cfg)
            | Self::UnQLite(cfg)
            | Self::Lmdb(cfg)
            | Self::UpscaleDb(cfg)
            | Self::ForestDb(cfg) => Some(cfg),
            _ => None,
        }
    }

    /// Mutable access to the configuration of embedded engines
    pub fn local_mut(&mut self) -> Option<&mut LocalConfig> {
        match self {
            Self::LevelDb(cfg)
            | Self::RocksDb(cfg)
            | Self::UnQLite(cfg)
            | Self::Lmdb(cfg)
            | Self::UpscaleDb(cfg)
            | Self::ForestDb(cfg) => Some(cfg),
            _ => None,
        }
    }
}

fn parse_port(raw: &str) -> Result<u16, String> {
    raw.parse().map_err(|_| format!("invalid port '{raw}'"))
}

/// Accumulates rendered command-line tokens
#[derive(Default)]
struct CommandLine {
    out: String,
}

impl CommandLine {
    fn flag(&mut self, flag: &str) {
        if !self.out.is_empty() {
            self.out.push(' ');
        }
        self.out.push_str(flag);
    }

    fn pair(&mut self, flag: &str, value: &str) {
        self.flag(flag);
        self.out.push(' ');
        self.out.push_str(&quote(value));
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Quotes a token if it would not survive [`tokenize`] as-is
fn quote(token: &str) -> String {
    let needs_quotes =
        token.is_empty() || token.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\');
    if !needs_quotes {
        return token.to_string();
    }

    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('"');
    for ch in token.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Splits a command line into tokens
///
/// Tokens are separated by whitespace. A double-quoted section may contain
/// whitespace; inside quotes `\"` and `\\` are escapes.
fn tokenize(text: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            '\\' if in_quotes => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => return Err("dangling escape at end of input".to_string()),
            },
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
