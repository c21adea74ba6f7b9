//! Probe for embedded (file-backed) engines.

use std::path::PathBuf;

use tracing::debug;

use super::{EngineAdapter, EngineError, EngineResult};
use crate::models::{EngineConfig, LocalConfig};

/// Checks that an embedded database can be opened
///
/// The database path must exist, or `create_if_missing` must be set and the
/// parent directory must exist. Read-only databases must exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedProbeAdapter;

impl EmbeddedProbeAdapter {
    /// Expands `~` in a configured database path
    #[must_use]
    pub fn resolve_path(db_path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(db_path).into_owned())
    }

    fn probe(cfg: &LocalConfig) -> EngineResult<()> {
        let path = Self::resolve_path(&cfg.db_path);

        if path.exists() {
            debug!(path = %path.display(), "Embedded database found");
            return Ok(());
        }

        if cfg.read_only || !cfg.create_if_missing {
            return Err(EngineError::DatabaseNotFound(path.display().to_string()));
        }

        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        match parent {
            Some(dir) if !dir.is_dir() => Err(EngineError::DatabaseNotFound(format!(
                "parent directory {} does not exist",
                dir.display()
            ))),
            _ => Ok(()),
        }
    }
}

impl EngineAdapter for EmbeddedProbeAdapter {
    fn test_connection(&self, config: &EngineConfig) -> EngineResult<()> {
        let cfg = config.local().ok_or_else(|| {
            EngineError::InvalidConfig(format!(
                "{} is not an embedded engine",
                config.connection_type()
            ))
        })?;
        Self::probe(cfg)
    }
}
