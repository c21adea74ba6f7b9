//! Probe and topology discovery for Redis-protocol servers (Redis, Pika).

use std::io::{BufReader, Read, Write};
use std::time::Duration;

use secrecy::ExposeSecret;
use tracing::{debug, warn};

use super::resp::{RespReader, RespValue, encode_command};
use super::tcp::{connect_tcp, map_io_error};
use super::{
    EngineAdapter, EngineError, EngineResult, ServerDiscoveryClusterInfo,
    ServerDiscoverySentinelInfo, ServerRole,
};
use crate::models::{EngineConfig, HostAndPort, RedisConfig};

/// Adapter speaking RESP over TCP or a Unix socket
#[derive(Debug, Clone)]
pub struct RedisCompatAdapter {
    timeout: Duration,
}

impl RedisCompatAdapter {
    /// Creates an adapter with the given connect and read timeout
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn redis_config(config: &EngineConfig) -> EngineResult<&RedisConfig> {
        match config {
            EngineConfig::Redis(cfg) | EngineConfig::Pika(cfg) => Ok(cfg),
            other => Err(EngineError::InvalidConfig(format!(
                "{} does not speak the Redis protocol",
                other.connection_type()
            ))),
        }
    }

    /// Opens an authenticated session with the configured database selected
    fn session(&self, cfg: &RedisConfig) -> EngineResult<Session> {
        let (stream, target) = self.open_stream(cfg)?;
        let mut session = Session {
            reader: RespReader::new(BufReader::new(stream)),
            target,
            timeout: self.timeout,
        };

        if let Some(password) = &cfg.password {
            match session.command(&["AUTH", password.expose_secret()])? {
                RespValue::SimpleString(ok) if ok == "OK" => {}
                RespValue::Error(e) => return Err(EngineError::Auth(e)),
                other => return Err(unexpected("AUTH", &other)),
            }
        }

        if cfg.db_num != 0 {
            let db = cfg.db_num.to_string();
            if let RespValue::Error(e) = session.command(&["SELECT", &db])? {
                return Err(EngineError::Protocol(format!("SELECT {db}: {e}")));
            }
        }

        Ok(session)
    }

    /// Connects and returns the stream with the name used in error messages
    fn open_stream(&self, cfg: &RedisConfig) -> EngineResult<(Box<dyn Stream>, String)> {
        #[cfg(unix)]
        if let Some(socket) = &cfg.unix_socket {
            let path = shellexpand::tilde(&socket.to_string_lossy()).into_owned();
            let stream = std::os::unix::net::UnixStream::connect(&path)
                .map_err(|e| map_io_error(&e, &path, self.timeout))?;
            stream.set_read_timeout(Some(self.timeout)).ok();
            stream.set_write_timeout(Some(self.timeout)).ok();
            return Ok((Box::new(stream), path));
        }

        let stream = connect_tcp(&cfg.host, self.timeout)?;
        Ok((Box::new(stream), cfg.host.to_string()))
    }
}

impl EngineAdapter for RedisCompatAdapter {
    fn test_connection(&self, config: &EngineConfig) -> EngineResult<()> {
        let cfg = Self::redis_config(config)?;

        if cfg.ssh.is_enabled() {
            debug!(ssh_host = %cfg.ssh.host, "Probing SSH endpoint only");
            return connect_tcp(&cfg.ssh.host, self.timeout).map(drop);
        }

        let mut session = self.session(cfg)?;
        match session.command(&["PING"])? {
            RespValue::SimpleString(pong) if pong == "PONG" => Ok(()),
            RespValue::Error(e) if e.starts_with("NOAUTH") => Err(EngineError::Auth(e)),
            other => Err(unexpected("PING", &other)),
        }
    }

    fn discover_cluster(
        &self,
        config: &EngineConfig,
    ) -> EngineResult<Vec<ServerDiscoveryClusterInfo>> {
        let cfg = Self::redis_config(config)?;
        if cfg.ssh.is_enabled() {
            return Err(EngineError::Unsupported("discovery through an SSH tunnel"));
        }

        let mut session = self.session(cfg)?;
        let reply = session.command(&["CLUSTER", "NODES"])?;
        let text = match &reply {
            RespValue::Error(e) => return Err(EngineError::Protocol(format!("CLUSTER NODES: {e}"))),
            other => other
                .as_str()
                .ok_or_else(|| unexpected("CLUSTER NODES", other))?,
        };

        Ok(parse_cluster_nodes(text))
    }

    fn discover_sentinel(
        &self,
        config: &EngineConfig,
    ) -> EngineResult<Vec<ServerDiscoverySentinelInfo>> {
        let cfg = Self::redis_config(config)?;
        if cfg.ssh.is_enabled() {
            return Err(EngineError::Unsupported("discovery through an SSH tunnel"));
        }

        let mut session = self.session(cfg)?;
        let masters = session.command(&["SENTINEL", "MASTERS"])?;
        let masters = match &masters {
            RespValue::Error(e) => {
                return Err(EngineError::Protocol(format!("SENTINEL MASTERS: {e}")));
            }
            other => other
                .as_array()
                .ok_or_else(|| unexpected("SENTINEL MASTERS", other))?,
        };

        let mut servers = Vec::new();
        for master in masters {
            let Some(name) = master.field("name") else {
                warn!("Skipping sentinel master entry without a name");
                continue;
            };
            if let Some(host) = endpoint(master) {
                servers.push(ServerDiscoverySentinelInfo {
                    master_name: name.to_string(),
                    host,
                    role: ServerRole::Master,
                });
            }

            let replicas = session.command(&["SENTINEL", "SLAVES", name])?;
            for replica in replicas.as_array().unwrap_or_default() {
                if let Some(host) = endpoint(replica) {
                    servers.push(ServerDiscoverySentinelInfo {
                        master_name: name.to_string(),
                        host,
                        role: ServerRole::Slave,
                    });
                }
            }
        }

        Ok(servers)
    }
}

/// Byte stream a session can run over
trait Stream: Read + Write + Send {}

impl<T: Read + Write + Send> Stream for T {}

struct Session {
    reader: RespReader<BufReader<Box<dyn Stream>>>,
    target: String,
    timeout: Duration,
}

impl Session {
    fn command(&mut self, args: &[&str]) -> EngineResult<RespValue> {
        let io_err = |e: std::io::Error| map_io_error(&e, &self.target, self.timeout);

        let stream = self.reader.get_mut().get_mut();
        stream.write_all(&encode_command(args)).map_err(io_err)?;
        stream.flush().map_err(io_err)?;
        self.reader.read_value().map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                EngineError::Protocol(format!("{} reply: {e}", args[0]))
            } else {
                map_io_error(&e, &self.target, self.timeout)
            }
        })
    }
}

fn unexpected(command: &str, reply: &RespValue) -> EngineError {
    EngineError::Protocol(format!("unexpected {command} reply: {reply:?}"))
}

fn endpoint(entry: &RespValue) -> Option<HostAndPort> {
    let ip = entry.field("ip")?;
    let port = entry.field("port")?.parse().ok()?;
    Some(HostAndPort::new(ip, port))
}

/// Parses the text reply of `CLUSTER NODES`
///
/// Each line is `<id> <ip:port@cport> <flags> <master> <ping-sent>
/// <pong-recv> <config-epoch> <link-state> [slots...]`. Malformed lines are
/// skipped.
#[must_use]
pub fn parse_cluster_nodes(text: &str) -> Vec<ServerDiscoveryClusterInfo> {
    text.lines().filter_map(parse_cluster_node_line).collect()
}

fn parse_cluster_node_line(line: &str) -> Option<ServerDiscoveryClusterInfo> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 8 {
        return None;
    }

    // ip:port@cport[,hostname]
    let addr = parts[1].split(',').next()?;
    let host_port = addr.split('@').next()?;
    let (ip, port) = host_port.rsplit_once(':')?;
    let port = port.parse().ok()?;

    let flags: Vec<&str> = parts[2].split(',').collect();
    let role = if flags.iter().any(|f| *f == "slave" || *f == "replica") {
        ServerRole::Slave
    } else {
        ServerRole::Master
    };

    Some(ServerDiscoveryClusterInfo {
        id: parts[0].to_string(),
        host: HostAndPort::new(ip, port),
        role,
        is_self: flags.contains(&"myself"),
        connected: parts[7] == "connected",
    })
}
