//! Configuration directory access

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::settings::AppSettings;
use crate::error::{ConfigError, ConfigResult, StoreResult};
use crate::factory::ConnectionSettingsFactory;
use crate::manager::ServersManager;
use crate::store::{ProfileStore, SkippedLine};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "NOSQLCONN_CONFIG_DIR";

const APP_DIR: &str = "nosqlconn";
const SETTINGS_FILE: &str = "settings.toml";
const PROFILES_FILE: &str = "connections.txt";

/// Loads and saves the files of the configuration directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Resolves `$NOSQLCONN_CONFIG_DIR`, then the platform configuration
    /// directory
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if neither is available.
    pub fn new() -> ConfigResult<Self> {
        let config_dir = std::env::var_os(CONFIG_DIR_ENV)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join(APP_DIR)))
            .ok_or(ConfigError::NoConfigDir)?;
        debug!(dir = %config_dir.display(), "Using configuration directory");
        Ok(Self { config_dir })
    }

    /// Uses an explicit configuration directory
    #[must_use]
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of `settings.toml`
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Path of the connection profiles file
    #[must_use]
    pub fn profiles_path(&self) -> PathBuf {
        self.config_dir.join(PROFILES_FILE)
    }

    /// Loads the application settings; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or holds
    /// invalid values.
    pub fn load_settings(&self) -> ConfigResult<AppSettings> {
        let path = self.settings_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(AppSettings::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let settings: AppSettings = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        settings.validate()?;
        info!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Writes the application settings, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or cannot be written.
    pub fn save_settings(&self, settings: &AppSettings) -> ConfigResult<()> {
        settings.validate()?;
        let text =
            toml::to_string_pretty(settings).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::create_dir_all(&self.config_dir).map_err(|source| ConfigError::Io {
            path: self.config_dir.clone(),
            source,
        })?;
        let path = self.settings_path();
        fs::write(&path, text).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Loads the connection profiles
    ///
    /// # Errors
    ///
    /// Returns an error if the profiles file exists but cannot be read.
    pub fn load_profiles(
        &self,
        factory: &ConnectionSettingsFactory,
    ) -> StoreResult<(ProfileStore, Vec<SkippedLine>)> {
        let mut store = ProfileStore::new();
        let skipped = store.load(&self.profiles_path(), factory)?;
        Ok((store, skipped))
    }

    /// Saves the connection profiles
    ///
    /// # Errors
    ///
    /// Returns an error if the profiles file cannot be written.
    pub fn save_profiles(&self, store: &ProfileStore) -> StoreResult<()> {
        store.save(&self.profiles_path())
    }

    /// Directory for per-connection history logs
    #[must_use]
    pub fn log_directory(&self, settings: &AppSettings) -> PathBuf {
        match &settings.logging.directory {
            Some(dir) => {
                let expanded = PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).as_ref());
                if expanded.is_absolute() {
                    expanded
                } else {
                    self.config_dir.join(expanded)
                }
            }
            None => self.default_log_directory(),
        }
    }

    /// `<data-local-dir>/nosqlconn/logs`, or `logs` under the configuration
    /// directory when the platform has no data directory
    #[must_use]
    pub fn default_log_directory(&self) -> PathBuf {
        dirs::data_local_dir().map_or_else(
            || self.config_dir.join("logs"),
            |dir| dir.join(APP_DIR).join("logs"),
        )
    }

    /// Factory writing history logs into the configured directory
    #[must_use]
    pub fn create_factory(&self, settings: &AppSettings) -> ConnectionSettingsFactory {
        ConnectionSettingsFactory::new(self.log_directory(settings))
    }

    /// Servers manager using the configured probe timeout
    #[must_use]
    pub fn create_servers_manager(&self, settings: &AppSettings) -> ServersManager {
        ServersManager::with_timeout(settings.connection.timeout())
    }
}
