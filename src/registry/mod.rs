//! Repo registry
//!
//! Persistent per-worker map of logical repo name to local path. The
//! registry is what lets operators address repositories by name instead of
//! path on machines that share no filesystem. The document is keyed by
//! worker name, each entry carrying a `repos` map; updates are written with
//! atomic replace so a crash mid-update never leaves a torn file.

use crate::config::atomic_write;
use crate::error::SyncError;
use crate::system::System;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub mod resolver;

pub use resolver::{ConflictResolver, InteractiveResolver, NonInteractiveResolver};

/// Per-worker registry entry
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct WorkerEntry {
    #[serde(default)]
    pub repos: BTreeMap<String, PathBuf>,
}

/// The full registry document, keyed by worker name
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(transparent)]
pub struct Registry {
    workers: BTreeMap<String, WorkerEntry>,
}

impl Registry {
    /// A registry with no entries
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the registry document
    ///
    /// A missing file is a configuration error: the store must be created
    /// with `repofleet init` before any registry-backed operation runs.
    pub fn load(system: &dyn System, path: &Path) -> Result<Self> {
        if !system.exists(path) {
            return Err(SyncError::configuration(format!(
                "Registry not found at {}; run 'repofleet init' first",
                path.display()
            ))
            .into());
        }

        let content = system
            .read_to_string(path)
            .with_context(|| format!("Failed to read registry: {}", path.display()))?;

        let registry = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse registry: {}", path.display()))?;

        Ok(registry)
    }

    /// Persist the registry document with atomic replace
    pub fn save(&self, system: &dyn System, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize registry")?;
        atomic_write(system, path, yaml.as_bytes())
            .with_context(|| format!("Failed to write registry: {}", path.display()))?;
        Ok(())
    }

    /// Look up the local path registered for `(worker, repo_name)`
    #[must_use]
    pub fn lookup(&self, worker: &str, repo_name: &str) -> Option<&Path> {
        self.workers
            .get(worker)?
            .repos
            .get(repo_name)
            .map(PathBuf::as_path)
    }

    /// Reverse lookup: the name `path` is registered under on `worker`
    ///
    /// Used to keep repeated sends from the same directory idempotent even
    /// when the defaulted name has drifted.
    #[must_use]
    pub fn lookup_by_path(&self, worker: &str, path: &Path) -> Option<&str> {
        self.workers.get(worker)?.repos.iter().find_map(|(name, registered)| {
            if registered == path {
                Some(name.as_str())
            } else {
                None
            }
        })
    }

    /// Unconditionally map `(worker, repo_name)` to `path`
    ///
    /// Callers must have resolved collisions first.
    pub fn register(&mut self, worker: &str, repo_name: &str, path: &Path) {
        self.workers
            .entry(worker.to_owned())
            .or_default()
            .repos
            .insert(repo_name.to_owned(), path.to_path_buf());
    }

    /// Remove the mapping for `(worker, repo_name)`, reporting whether one
    /// existed
    pub fn remove(&mut self, worker: &str, repo_name: &str) -> bool {
        match self.workers.get_mut(worker) {
            Some(entry) => entry.repos.remove(repo_name).is_some(),
            None => false,
        }
    }

    /// Iterate workers and their repo maps, in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WorkerEntry)> {
        self.workers
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    /// Resolve the registry name to send `path` under on `worker`
    ///
    /// Implements the collision algorithm:
    /// 1. An unknown worker degrades: warn and pass the name through
    ///    without registering.
    /// 2. A path already registered under another name wins over a
    ///    defaulted name (idempotent re-sends).
    /// 3. A name taken by a different path is fatal when explicit,
    ///    otherwise resolved by re-prompting through `resolver` until the
    ///    supplied name is unused or already maps to `path`.
    /// 4. Anything else registers and returns the requested name.
    pub fn resolve_for_send(
        &mut self,
        worker: &str,
        worker_known: bool,
        repo_name: &str,
        path: &Path,
        explicit_name: bool,
        resolver: &dyn ConflictResolver,
    ) -> Result<String> {
        if !worker_known {
            warn!(
                "Worker '{}' is not in the worker directory; sending '{}' unregistered",
                worker, repo_name
            );
            return Ok(repo_name.to_owned());
        }

        if !explicit_name
            && let Some(existing) = self.lookup_by_path(worker, path)
            && existing != repo_name
        {
            debug!(
                "Path {} already registered on '{}' as '{}'; reusing it",
                path.display(),
                worker,
                existing
            );
            return Ok(existing.to_owned());
        }

        let mut candidate = repo_name.to_owned();
        loop {
            match self.lookup(worker, &candidate) {
                Some(registered) if registered != path => {
                    if explicit_name {
                        return Err(SyncError::collision(format!(
                            "repo name '{}' on worker '{}' already maps to {}; \
                             choose another name",
                            candidate,
                            worker,
                            registered.display()
                        ))
                        .into());
                    }
                    let taken_by = registered.to_path_buf();
                    candidate = resolver.resolve_name_conflict(&candidate, &taken_by)?;
                }
                _ => {
                    self.register(worker, &candidate, path);
                    return Ok(candidate);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockSystem;
    use std::sync::Mutex;

    /// Resolver replaying queued names and counting how often it was asked
    struct QueuedResolver {
        names: Mutex<Vec<String>>,
        asked: Mutex<u32>,
    }

    impl QueuedResolver {
        fn new(names: &[&str]) -> Self {
            Self {
                names: Mutex::new(names.iter().rev().map(|n| (*n).to_owned()).collect()),
                asked: Mutex::new(0),
            }
        }

        fn times_asked(&self) -> u32 {
            *self.asked.lock().unwrap()
        }
    }

    impl ConflictResolver for QueuedResolver {
        fn resolve_name_conflict(&self, _candidate: &str, _taken_by: &Path) -> Result<String> {
            *self.asked.lock().unwrap() += 1;
            self.names
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| anyhow::anyhow!("resolver queue exhausted"))
        }
    }

    #[test]
    fn test_register_then_lookup() {
        let mut registry = Registry::empty();
        registry.register("alpha", "proj", Path::new("/home/u/proj"));

        assert_eq!(
            registry.lookup("alpha", "proj"),
            Some(Path::new("/home/u/proj"))
        );
        assert_eq!(registry.lookup("beta", "proj"), None);
        assert_eq!(
            registry.lookup_by_path("alpha", Path::new("/home/u/proj")),
            Some("proj")
        );
    }

    #[test]
    fn test_resolve_registers_fresh_name() {
        let mut registry = Registry::empty();
        let resolver = QueuedResolver::new(&[]);

        let name = registry
            .resolve_for_send("alpha", true, "proj", Path::new("/home/u/proj"), false, &resolver)
            .unwrap();

        assert_eq!(name, "proj");
        assert_eq!(
            registry.lookup("alpha", "proj"),
            Some(Path::new("/home/u/proj"))
        );
        assert_eq!(resolver.times_asked(), 0);
    }

    #[test]
    fn test_resolve_is_idempotent_without_prompting() {
        let mut registry = Registry::empty();
        let resolver = QueuedResolver::new(&[]);
        let path = Path::new("/home/u/proj");

        let first = registry
            .resolve_for_send("alpha", true, "proj", path, false, &resolver)
            .unwrap();
        let second = registry
            .resolve_for_send("alpha", true, "proj", path, false, &resolver)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(resolver.times_asked(), 0);
    }

    #[test]
    fn test_resolve_reuses_name_after_default_drift() {
        // The same working copy sent again with a different defaulted name
        // keeps its original registration.
        let mut registry = Registry::empty();
        let resolver = QueuedResolver::new(&[]);
        let path = Path::new("/home/u/proj");

        registry.register("alpha", "proj", path);
        let name = registry
            .resolve_for_send("alpha", true, "renamed-dir", path, false, &resolver)
            .unwrap();

        assert_eq!(name, "proj");
        assert_eq!(registry.lookup("alpha", "renamed-dir"), None);
    }

    #[test]
    fn test_explicit_collision_fails_without_mutation() {
        let mut registry = Registry::empty();
        let resolver = QueuedResolver::new(&[]);
        registry.register("alpha", "proj", Path::new("/home/u/proj"));

        let result = registry.resolve_for_send(
            "alpha",
            true,
            "proj",
            Path::new("/home/u/other"),
            true,
            &resolver,
        );

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Collision error"));
        assert_eq!(
            registry.lookup("alpha", "proj"),
            Some(Path::new("/home/u/proj"))
        );
        assert_eq!(registry.lookup_by_path("alpha", Path::new("/home/u/other")), None);
    }

    #[test]
    fn test_default_collision_prompts_until_free_name() {
        // Two distinct working copies both named proj1; the second send
        // resolves through the prompt and both registrations persist.
        let mut registry = Registry::empty();
        registry.register("alpha", "proj1", Path::new("/home/u/proj1"));

        let resolver = QueuedResolver::new(&["proj1-v2"]);
        let name = registry
            .resolve_for_send(
                "alpha",
                true,
                "proj1",
                Path::new("/home/u/projects/proj1"),
                false,
                &resolver,
            )
            .unwrap();

        assert_eq!(name, "proj1-v2");
        assert_eq!(resolver.times_asked(), 1);
        assert_eq!(
            registry.lookup("alpha", "proj1"),
            Some(Path::new("/home/u/proj1"))
        );
        assert_eq!(
            registry.lookup("alpha", "proj1-v2"),
            Some(Path::new("/home/u/projects/proj1"))
        );
    }

    #[test]
    fn test_prompt_loops_past_still_taken_names() {
        let mut registry = Registry::empty();
        registry.register("alpha", "proj", Path::new("/a"));
        registry.register("alpha", "proj-v2", Path::new("/b"));

        let resolver = QueuedResolver::new(&["proj-v2", "proj-v3"]);
        let name = registry
            .resolve_for_send("alpha", true, "proj", Path::new("/c"), false, &resolver)
            .unwrap();

        assert_eq!(name, "proj-v3");
        assert_eq!(resolver.times_asked(), 2);
    }

    #[test]
    fn test_unknown_worker_passes_name_through() {
        let mut registry = Registry::empty();
        let resolver = QueuedResolver::new(&[]);

        let name = registry
            .resolve_for_send("ghost", false, "proj", Path::new("/home/u/proj"), false, &resolver)
            .unwrap();

        assert_eq!(name, "proj");
        assert_eq!(registry.lookup("ghost", "proj"), None);
    }

    #[test]
    fn test_load_missing_store_is_configuration_error() {
        let system = MockSystem::new();
        let err = Registry::load(&system, Path::new("/store/registry.yaml")).unwrap_err();
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("repofleet init"));
    }

    #[test]
    fn test_save_load_round_trip() {
        let system = MockSystem::new().with_dir("/store");
        let path = Path::new("/store/registry.yaml");

        let mut registry = Registry::empty();
        registry.register("alpha", "proj", Path::new("/home/u/proj"));
        registry.register("beta", "proj", Path::new("/srv/proj"));
        registry.save(&system, path).unwrap();

        let loaded = Registry::load(&system, path).unwrap();
        assert_eq!(
            loaded.lookup("alpha", "proj"),
            Some(Path::new("/home/u/proj"))
        );
        assert_eq!(loaded.lookup("beta", "proj"), Some(Path::new("/srv/proj")));
    }
}
