//! TCP reachability probe.

use std::fmt;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use super::{EngineAdapter, EngineError, EngineResult};
use crate::models::{EngineConfig, HostAndPort};

/// Opens a TCP connection with the given connect and I/O timeout
///
/// Every resolved address is tried in turn; the error of the last attempt is
/// returned when none accepts the connection.
///
/// # Errors
///
/// * `EngineError::DnsResolutionFailed` if the host does not resolve
/// * `EngineError::ConnectionRefused`, `Timeout` or `HostUnreachable` if no
///   address accepts the connection
pub fn connect_tcp(host: &HostAndPort, timeout: Duration) -> EngineResult<TcpStream> {
    let addrs: Vec<SocketAddr> = (host.host.as_str(), host.port)
        .to_socket_addrs()
        .map_err(|e| EngineError::DnsResolutionFailed(format!("{}: {e}", host.host)))?
        .collect();

    if addrs.is_empty() {
        return Err(EngineError::DnsResolutionFailed(format!(
            "{}: no addresses found",
            host.host
        )));
    }

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(timeout)).ok();
                stream.set_write_timeout(Some(timeout)).ok();
                stream.set_nodelay(true).ok();
                return Ok(stream);
            }
            Err(e) => {
                debug!(%addr, error = %e, "TCP connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.map_or_else(
        || EngineError::HostUnreachable(host.to_string()),
        |e| map_io_error(&e, host, timeout),
    ))
}

/// Maps a socket error onto the adapter error taxonomy
pub(crate) fn map_io_error<T>(err: &io::Error, target: &T, timeout: Duration) -> EngineError
where
    T: fmt::Display + ?Sized,
{
    match err.kind() {
        io::ErrorKind::ConnectionRefused => EngineError::ConnectionRefused(target.to_string()),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
            EngineError::Timeout(timeout.as_secs())
        }
        io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
            EngineError::HostUnreachable(format!("{target}: {err}"))
        }
        _ => EngineError::Io(format!("{target}: {err}")),
    }
}

/// Probe for engines whose reachability is all the core can check
/// (Memcached, SSDB)
#[derive(Debug, Clone)]
pub struct TcpProbeAdapter {
    timeout: Duration,
}

impl TcpProbeAdapter {
    /// Creates a probe with the given timeout
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl EngineAdapter for TcpProbeAdapter {
    fn test_connection(&self, config: &EngineConfig) -> EngineResult<()> {
        let host = config.host().ok_or_else(|| {
            EngineError::InvalidConfig(format!(
                "{} has no network endpoint",
                config.connection_type()
            ))
        })?;
        connect_tcp(host, self.timeout).map(drop)
    }
}
