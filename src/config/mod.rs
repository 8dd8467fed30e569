//! Store location and initialization
//!
//! All persistent documents live in one directory: the registry, the
//! transfer state and the worker directory. The location defaults to
//! `<config_dir>/repofleet` and can be overridden with `REPOFLEET_HOME`,
//! which is also how tests isolate their stores.

use crate::error::SyncError;
use crate::registry::Registry;
use crate::system::System;
use anyhow::Result;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable overriding the store directory
pub const HOME_ENV: &str = "REPOFLEET_HOME";

/// Resolved locations of the persistent documents
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub dir: PathBuf,
}

impl StorePaths {
    /// Resolve the store directory from the environment or the platform
    /// config directory.
    pub fn resolve(system: &dyn System) -> Result<Self> {
        if let Ok(dir) = system.env_var(HOME_ENV) {
            return Ok(Self {
                dir: PathBuf::from(dir),
            });
        }

        let base = system.config_dir().ok_or_else(|| {
            return SyncError::configuration(
                "Cannot determine a configuration directory; set REPOFLEET_HOME",
            );
        })?;

        Ok(Self {
            dir: base.join("repofleet"),
        })
    }

    /// Path of the registry document
    #[must_use]
    pub fn registry_file(&self) -> PathBuf {
        self.dir.join("registry.yaml")
    }

    /// Path of the transfer state document
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.dir.join("state.yaml")
    }

    /// Path of the worker directory document
    #[must_use]
    pub fn workers_file(&self) -> PathBuf {
        self.dir.join("workers.yaml")
    }
}

/// Write `contents` to `path` through a sidecar temp file and a rename,
/// so a crash mid-update leaves either the prior document or the new one,
/// never a partial file.
pub fn atomic_write(system: &dyn System, path: &Path, contents: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    system.write(&tmp, contents)?;
    system.rename(&tmp, path)
}

/// Initialize the store: create the directory and an empty registry
/// document. Idempotent; an existing registry is left untouched.
pub fn init_store(system: &dyn System, paths: &StorePaths) -> Result<()> {
    system.create_dir_all(&paths.dir)?;

    let registry_file = paths.registry_file();
    if system.exists(&registry_file) {
        info!("Registry already initialized at {}", registry_file.display());
        return Ok(());
    }

    Registry::empty().save(system, &registry_file)?;
    info!("Initialized registry at {}", registry_file.display());

    Ok(())
}
