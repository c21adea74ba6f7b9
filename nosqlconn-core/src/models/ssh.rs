//! SSH tunnel parameters for Redis-compatible connections.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::host::HostAndPort;
use crate::error::SettingsError;

/// Default SSH port used when a blob omits one
pub const DEFAULT_SSH_PORT: u16 = 22;

/// SSH authentication method
///
/// The discriminant is the digit written to the `method` field of the blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SshAuthMethod {
    /// SSH tunnelling is disabled
    #[default]
    Unknown = 0,
    /// Password authentication
    Password = 1,
    /// Public key authentication
    PublicKey = 2,
}

impl SshAuthMethod {
    /// Looks up a method by its serialized digit
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Unknown),
            1 => Some(Self::Password),
            2 => Some(Self::PublicKey),
            _ => None,
        }
    }
}

/// SSH tunnel configuration
#[derive(Debug, Clone)]
pub struct SshInfo {
    /// SSH server endpoint
    pub host: HostAndPort,
    /// Login user
    pub user: String,
    /// Password for [`SshAuthMethod::Password`]
    pub password: Option<SecretString>,
    /// Public key file
    pub public_key: Option<PathBuf>,
    /// Private key file
    pub private_key: Option<PathBuf>,
    /// Passphrase protecting the private key
    pub passphrase: Option<SecretString>,
    /// Authentication method
    pub method: SshAuthMethod,
}

impl Default for SshInfo {
    fn default() -> Self {
        Self {
            host: HostAndPort::new("", DEFAULT_SSH_PORT),
            user: String::new(),
            password: None,
            public_key: None,
            private_key: None,
            passphrase: None,
            method: SshAuthMethod::Unknown,
        }
    }
}

impl SshInfo {
    /// Creates password-authenticated SSH settings
    #[must_use]
    pub fn with_password(host: HostAndPort, user: impl Into<String>, password: SecretString) -> Self {
        Self {
            host,
            user: user.into(),
            password: Some(password),
            method: SshAuthMethod::Password,
            ..Self::default()
        }
    }

    /// Creates key-authenticated SSH settings
    #[must_use]
    pub fn with_private_key(
        host: HostAndPort,
        user: impl Into<String>,
        private_key: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host,
            user: user.into(),
            private_key: Some(private_key.into()),
            method: SshAuthMethod::PublicKey,
            ..Self::default()
        }
    }

    /// Returns true if the connection should go through an SSH tunnel
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.method != SshAuthMethod::Unknown && !self.host.host.is_empty()
    }
}

/// Compares two optional secrets by value
pub(crate) fn secret_eq(a: Option<&SecretString>, b: Option<&SecretString>) -> bool {
    a.map(ExposeSecret::expose_secret) == b.map(ExposeSecret::expose_secret)
}

impl PartialEq for SshInfo {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host
            && self.user == other.user
            && secret_eq(self.password.as_ref(), other.password.as_ref())
            && self.public_key == other.public_key
            && self.private_key == other.private_key
            && secret_eq(self.passphrase.as_ref(), other.passphrase.as_ref())
            && self.method == other.method
    }
}

impl Eq for SshInfo {}

const FIELD_SEPARATOR: char = ';';
const KEY_SEPARATOR: char = ':';

/// Renders the blob as `host:<h:p>;user:<u>;...;method:<digit>;`
///
/// Values must not contain `;`.
impl fmt::Display for SshInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        let secret = |s: &Option<SecretString>| {
            s.as_ref()
                .map(|s| s.expose_secret().to_string())
                .unwrap_or_default()
        };

        write!(f, "host{KEY_SEPARATOR}{}{FIELD_SEPARATOR}", self.host)?;
        write!(f, "user{KEY_SEPARATOR}{}{FIELD_SEPARATOR}", self.user)?;
        write!(f, "password{KEY_SEPARATOR}{}{FIELD_SEPARATOR}", secret(&self.password))?;
        write!(f, "public_key{KEY_SEPARATOR}{}{FIELD_SEPARATOR}", path(&self.public_key))?;
        write!(f, "private_key{KEY_SEPARATOR}{}{FIELD_SEPARATOR}", path(&self.private_key))?;
        write!(f, "passphrase{KEY_SEPARATOR}{}{FIELD_SEPARATOR}", secret(&self.passphrase))?;
        write!(f, "method{KEY_SEPARATOR}{}{FIELD_SEPARATOR}", self.method as u8)
    }
}

impl FromStr for SshInfo {
    type Err = SettingsError;

    /// Parses the blob written by [`Display`](fmt::Display). Keys may appear
    /// in any order and missing keys keep their defaults.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut info = Self::default();

        for pair in s.split(FIELD_SEPARATOR).filter(|p| !p.trim().is_empty()) {
            let (key, value) = pair
                .split_once(KEY_SEPARATOR)
                .ok_or_else(|| SettingsError::InvalidSshInfo(format!("missing ':' in '{pair}'")))?;
            let non_empty = |v: &str| (!v.is_empty()).then(|| v.to_string());

            match key.trim() {
                "host" => {
                    let mut host: HostAndPort = value.parse()?;
                    // Only an omitted port falls back to 22; an explicit one is kept.
                    let tail = value.rsplit_once(']').map_or(value, |(_, tail)| tail);
                    if !tail.contains(':') {
                        host.port = DEFAULT_SSH_PORT;
                    }
                    info.host = host;
                }
                "user" => info.user = value.to_string(),
                "password" => info.password = non_empty(value).map(SecretString::from),
                "public_key" => info.public_key = non_empty(value).map(PathBuf::from),
                "private_key" => info.private_key = non_empty(value).map(PathBuf::from),
                "passphrase" => info.passphrase = non_empty(value).map(SecretString::from),
                "method" => {
                    info.method = value
                        .trim()
                        .parse::<u8>()
                        .ok()
                        .and_then(SshAuthMethod::from_index)
                        .ok_or_else(|| {
                            SettingsError::InvalidSshInfo(format!("unknown auth method '{value}'"))
                        })?;
                }
                other => {
                    return Err(SettingsError::InvalidSshInfo(format!("unknown key '{other}'")));
                }
            }
        }

        Ok(info)
    }
}
