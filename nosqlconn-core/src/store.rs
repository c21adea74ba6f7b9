//! Connection profile storage.
//!
//! A [`ProfileStore`] exclusively owns the settings of every saved
//! connection and persists them one serialized line per profile.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{SettingsError, StoreError, StoreResult};
use crate::factory::ConnectionSettingsFactory;
use crate::models::{ConnectionSettings, ConnectionSettingsPath};

/// Why a line of a profile file was not loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The line is not a valid serialized profile
    Parse(SettingsError),
    /// An earlier line already defined this path
    Duplicate(ConnectionSettingsPath),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Duplicate(path) => write!(f, "duplicate connection {path}"),
        }
    }
}

/// A profile line that was skipped during loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    /// Why the line was skipped
    pub reason: SkipReason,
}

/// Ordered collection of connection profiles keyed by path
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    profiles: Vec<Arc<ConnectionSettings>>,
}

impl ProfileStore {
    /// Creates an empty store
    #[must_use]
    pub const fn new() -> Self {
        Self {
            profiles: Vec::new(),
        }
    }

    fn position(&self, path: &ConnectionSettingsPath) -> Option<usize> {
        self.profiles.iter().position(|p| p.path() == path)
    }

    /// Adds a profile and returns the shared handle
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if a profile with the same path exists.
    pub fn add(&mut self, settings: ConnectionSettings) -> StoreResult<Arc<ConnectionSettings>> {
        if self.position(settings.path()).is_some() {
            return Err(StoreError::Duplicate(settings.path().clone()));
        }
        let settings = Arc::new(settings);
        self.profiles.push(Arc::clone(&settings));
        Ok(settings)
    }

    /// Looks up a profile by path
    #[must_use]
    pub fn get(&self, path: &ConnectionSettingsPath) -> Option<&Arc<ConnectionSettings>> {
        self.position(path).map(|i| &self.profiles[i])
    }

    /// Edits a profile in place
    ///
    /// The edit is applied to a copy, so servers created from the profile
    /// keep the previous value. If the edit moves the profile onto a path
    /// another profile holds, nothing is changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `path` is unknown, or
    /// [`StoreError::Duplicate`] if the edited path is already taken.
    pub fn update<F>(&mut self, path: &ConnectionSettingsPath, edit: F) -> StoreResult<()>
    where
        F: FnOnce(&mut ConnectionSettings),
    {
        let index = self
            .position(path)
            .ok_or_else(|| StoreError::NotFound(path.clone()))?;

        let mut edited = ConnectionSettings::clone(&self.profiles[index]);
        edit(&mut edited);

        if edited.path() != path && self.position(edited.path()).is_some() {
            return Err(StoreError::Duplicate(edited.path().clone()));
        }
        self.profiles[index] = Arc::new(edited);
        Ok(())
    }

    /// Removes a profile and returns it
    pub fn remove(&mut self, path: &ConnectionSettingsPath) -> Option<Arc<ConnectionSettings>> {
        let index = self.position(path)?;
        Some(self.profiles.remove(index))
    }

    /// Moves a profile to a new path and refreshes its hash
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `old` is unknown, or
    /// [`StoreError::Duplicate`] if `new` is already taken.
    pub fn rename(
        &mut self,
        old: &ConnectionSettingsPath,
        new: ConnectionSettingsPath,
    ) -> StoreResult<()> {
        let index = self
            .position(old)
            .ok_or_else(|| StoreError::NotFound(old.clone()))?;
        if old != &new && self.position(&new).is_some() {
            return Err(StoreError::Duplicate(new));
        }
        Arc::make_mut(&mut self.profiles[index]).set_connection_path_and_update_hash(new);
        Ok(())
    }

    /// Profiles in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ConnectionSettings>> {
        self.profiles.iter()
    }

    /// Number of profiles
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Returns true if the store holds no profile
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Adds every profile line of `text`
    ///
    /// Blank lines and lines starting with `#` are ignored. Lines that fail
    /// to parse or repeat a known path are skipped and reported.
    pub fn load_from_str(
        &mut self,
        text: &str,
        factory: &ConnectionSettingsFactory,
    ) -> Vec<SkippedLine> {
        let mut skipped = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let reason = match factory.create_from_string_connection(line) {
                Ok(settings) if self.position(settings.path()).is_some() => {
                    SkipReason::Duplicate(settings.path().clone())
                }
                Ok(settings) => {
                    self.profiles.push(Arc::new(settings));
                    continue;
                }
                Err(e) => SkipReason::Parse(e),
            };

            warn!(line = index + 1, reason = %reason, "Skipping connection profile");
            skipped.push(SkippedLine {
                line: index + 1,
                reason,
            });
        }

        skipped
    }

    /// Serializes every profile, one line each
    #[must_use]
    pub fn to_settings_text(&self) -> String {
        let mut text = String::new();
        for profile in &self.profiles {
            text.push_str(&profile.to_settings_string());
            text.push('\n');
        }
        text
    }

    /// Loads profiles from a file; a missing file loads nothing
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    pub fn load(
        &mut self,
        path: &Path,
        factory: &ConnectionSettingsFactory,
    ) -> StoreResult<Vec<SkippedLine>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No connection profiles file");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let skipped = self.load_from_str(&text, factory);
        info!(
            path = %path.display(),
            loaded = self.len(),
            skipped = skipped.len(),
            "Connection profiles loaded"
        );
        Ok(skipped)
    }

    /// Writes every profile to a file, creating the parent directory
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, self.to_settings_text()).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), count = self.len(), "Connection profiles saved");
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ProfileStore {
    type Item = &'a Arc<ConnectionSettings>;
    type IntoIter = std::slice::Iter<'a, Arc<ConnectionSettings>>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}
