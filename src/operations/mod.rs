//! User-facing operations
//!
//! Each operation is a synchronous pipeline over the injected
//! capabilities; failures short-circuit and per-operation temporary files
//! are released on every exit path.

pub mod admin;
pub mod apply;
pub mod bundle;
pub mod fetch;
pub mod send;

use crate::system::System;
use anyhow::Result;
use std::path::PathBuf;

/// The worker-side directory repos land in when no base path is given
pub fn default_base_path(system: &dyn System) -> Result<PathBuf> {
    let home = system.home_dir().ok_or_else(|| {
        return crate::error::SyncError::configuration(
            "cannot determine a home directory for the default base path; pass --base-path",
        );
    })?;
    Ok(home.join("repos"))
}

/// Expand a leading `~` against the system's home directory
///
/// Arguments arriving over ssh are usually expanded by the remote shell
/// already; this covers direct invocations.
pub fn expand_tilde(system: &dyn System, path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = system.home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Per-operation remote staging directory, unique per calling process
pub fn remote_staging_dir() -> String {
    return format!("/tmp/repofleet-{}", std::process::id());
}
