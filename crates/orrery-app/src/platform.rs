//! Platform directory resolution.
//!
//! Config and log directories follow OS conventions (XDG on Linux, Known
//! Folders on Windows, Library on macOS), resolved by `orrery-config`.

use std::io;
use std::path::{Path, PathBuf};

use orrery_config::Config;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("could not determine OS configuration directory")]
    NoConfigDir,
    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Where Orrery keeps its files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    /// Holds the debug-build JSON log.
    pub log_dir: PathBuf,
}

impl PlatformDirs {
    /// Resolve the OS directories without creating them.
    pub fn resolve() -> Result<Self, PlatformError> {
        let config_dir = Config::default_dir().ok_or(PlatformError::NoConfigDir)?;
        Ok(Self::from_config_dir(&config_dir))
    }

    /// Directories for an explicit config location (`--config`). Logs go
    /// beside the config file.
    pub fn from_config_dir(config_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            log_dir: config_dir.join("logs"),
        }
    }

    /// Create all directories on disk.
    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}
