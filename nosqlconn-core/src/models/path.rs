//! Connection profile identity path.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator used by every normalized connection path
pub const PATH_SEPARATOR: char = '/';

/// Slash-delimited path identifying a connection profile, e.g. `/work/cache1`.
///
/// The stored form is normalized: backslashes become `/`, runs of separators
/// collapse into one and a trailing separator is dropped unless the path is
/// the root itself. Equality and hashing operate on the normalized string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ConnectionSettingsPath {
    path: String,
}

impl ConnectionSettingsPath {
    /// Creates a path from a raw string, normalizing it
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self {
            path: normalize(raw),
        }
    }

    /// Returns the root path (`/`)
    #[must_use]
    pub fn root() -> Self {
        Self {
            path: PATH_SEPARATOR.to_string(),
        }
    }

    /// Value comparison of two normalized paths
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.path == other.path
    }

    /// Returns the last path segment (the connection name)
    #[must_use]
    pub fn name(&self) -> &str {
        self.path
            .rfind(PATH_SEPARATOR)
            .map_or(self.path.as_str(), |pos| &self.path[pos + 1..])
    }

    /// Returns everything up to and including the last separator
    ///
    /// A path without any separator has an empty directory.
    #[must_use]
    pub fn directory(&self) -> &str {
        self.path
            .rfind(PATH_SEPARATOR)
            .map_or("", |pos| &self.path[..=pos])
    }

    /// Appends a segment to this path
    #[must_use]
    pub fn join(&self, segment: &str) -> Self {
        if self.path.is_empty() {
            return Self::new(segment);
        }
        Self::new(&format!("{}{PATH_SEPARATOR}{segment}", self.path))
    }

    /// Returns true if this is the root path
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path.len() == 1 && self.path.starts_with(PATH_SEPARATOR)
    }

    /// Returns the normalized path as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }
}

fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let ch = if ch == '\\' { PATH_SEPARATOR } else { ch };
        if ch == PATH_SEPARATOR && out.ends_with(PATH_SEPARATOR) {
            continue;
        }
        out.push(ch);
    }
    if out.len() > 1 && out.ends_with(PATH_SEPARATOR) {
        out.pop();
    }
    out
}

impl fmt::Display for ConnectionSettingsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl FromStr for ConnectionSettingsPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for ConnectionSettingsPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ConnectionSettingsPath {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&Path> for ConnectionSettingsPath {
    fn from(path: &Path) -> Self {
        Self::new(&path.to_string_lossy())
    }
}

impl From<ConnectionSettingsPath> for String {
    fn from(path: ConnectionSettingsPath) -> Self {
        path.path
    }
}
