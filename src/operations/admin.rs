//! Registry maintenance operations
//!
//! Explicit registration, removal and listing of repo mappings, plus store
//! initialization. Sends auto-register, so these exist for the cases where
//! an operator wants to pre-seed or repair the registry by hand.

use crate::config::{self, StorePaths};
use crate::error::SyncError;
use crate::registry::Registry;
use crate::state::TransferState;
use crate::system::System;
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Create the store directory and an empty registry
pub fn init(system: &dyn System) -> Result<()> {
    let paths = StorePaths::resolve(system)?;
    config::init_store(system, &paths)
}

/// Explicitly map `(worker, repo_name)` to a local path
///
/// Refuses to overwrite a mapping to a different path; `remove` first.
pub fn register(system: &dyn System, worker: &str, repo_name: &str, path: &Path) -> Result<()> {
    let paths = StorePaths::resolve(system)?;
    let mut registry = Registry::load(system, &paths.registry_file())?;

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        system.current_dir()?.join(path)
    };

    if let Some(registered) = registry.lookup(worker, repo_name)
        && registered != absolute
    {
        return Err(SyncError::collision(format!(
            "repo name '{}' on worker '{}' already maps to {}; remove it first",
            repo_name,
            worker,
            registered.display()
        ))
        .into());
    }

    registry.register(worker, repo_name, &absolute);
    registry.save(system, &paths.registry_file())?;
    info!(
        "Registered '{}' on '{}' as {}",
        repo_name,
        worker,
        absolute.display()
    );
    Ok(())
}

/// Remove the mapping for `(worker, repo_name)` and its transfer state
pub fn remove(system: &dyn System, worker: &str, repo_name: &str) -> Result<()> {
    let paths = StorePaths::resolve(system)?;
    let mut registry = Registry::load(system, &paths.registry_file())?;

    if !registry.remove(worker, repo_name) {
        return Err(SyncError::configuration(format!(
            "no repo named '{}' is registered for worker '{}'",
            repo_name, worker
        ))
        .into());
    }

    registry.save(system, &paths.registry_file())?;

    let mut state = TransferState::load(system, &paths.state_file())?;
    if state.clear_repo(worker, repo_name) {
        state.save(system, &paths.state_file())?;
    }

    info!("Removed '{}' from '{}'", repo_name, worker);
    Ok(())
}

/// Print the registry, optionally restricted to one worker
pub fn list(system: &dyn System, worker: Option<&str>) -> Result<()> {
    let paths = StorePaths::resolve(system)?;
    let registry = Registry::load(system, &paths.registry_file())?;

    for (name, entry) in registry.iter() {
        if let Some(only) = worker
            && only != name
        {
            continue;
        }
        println!("{name}:");
        for (repo, path) in &entry.repos {
            println!("  {} -> {}", repo, path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HOME_ENV;
    use crate::system::MockSystem;
    use std::path::PathBuf;

    fn initialized_system() -> MockSystem {
        let system = MockSystem::new().with_env(HOME_ENV, "/store");
        init(&system).unwrap();
        system
    }

    #[test]
    fn test_register_and_remove_round_trip() {
        let system = initialized_system();

        register(&system, "alpha", "proj", Path::new("/home/u/proj")).unwrap();
        let paths = StorePaths::resolve(&system).unwrap();
        let registry = Registry::load(&system, &paths.registry_file()).unwrap();
        assert_eq!(
            registry.lookup("alpha", "proj"),
            Some(Path::new("/home/u/proj"))
        );

        remove(&system, "alpha", "proj").unwrap();
        let registry = Registry::load(&system, &paths.registry_file()).unwrap();
        assert_eq!(registry.lookup("alpha", "proj"), None);
    }

    #[test]
    fn test_register_conflicting_path_is_collision() {
        let system = initialized_system();
        register(&system, "alpha", "proj", Path::new("/home/u/proj")).unwrap();

        let err = register(&system, "alpha", "proj", Path::new("/home/u/other")).unwrap_err();
        assert!(err.to_string().contains("Collision error"));
    }

    #[test]
    fn test_register_same_path_is_idempotent() {
        let system = initialized_system();
        register(&system, "alpha", "proj", Path::new("/home/u/proj")).unwrap();
        register(&system, "alpha", "proj", Path::new("/home/u/proj")).unwrap();
    }

    #[test]
    fn test_register_resolves_relative_paths() {
        let system = initialized_system().with_current_dir("/home/u");
        register(&system, "alpha", "proj", Path::new("proj")).unwrap();

        let paths = StorePaths::resolve(&system).unwrap();
        let registry = Registry::load(&system, &paths.registry_file()).unwrap();
        assert_eq!(
            registry.lookup("alpha", "proj"),
            Some(PathBuf::from("/home/u/proj").as_path())
        );
    }

    #[test]
    fn test_remove_unknown_mapping_fails() {
        let system = initialized_system();
        let err = remove(&system, "alpha", "ghost").unwrap_err();
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_remove_drops_transfer_state_too() {
        let system = initialized_system();
        register(&system, "alpha", "proj", Path::new("/home/u/proj")).unwrap();

        let paths = StorePaths::resolve(&system).unwrap();
        let mut state = TransferState::default();
        state.record("alpha", "proj", "main", "abc123");
        state.save(&system, &paths.state_file()).unwrap();

        remove(&system, "alpha", "proj").unwrap();

        let state = TransferState::load(&system, &paths.state_file()).unwrap();
        assert_eq!(state.get("alpha", "proj", "main"), None);
    }
}
