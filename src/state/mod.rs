//! Transfer state store
//!
//! Records the last successfully synchronized commit per
//! `(worker, repo, branch)` so later sends can ship incremental bundles.
//! A missing file is an empty store, and stale entries are harmless: the
//! bundle builder degrades to a full bundle whenever a recorded commit is
//! no longer an ancestor of the branch tip.

use crate::config::atomic_write;
use crate::system::System;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Nested maps worker → repo → branch → last-synchronized commit id
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(transparent)]
pub struct TransferState {
    workers: BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>,
}

impl TransferState {
    /// Load the state document; a missing file yields an empty store
    pub fn load(system: &dyn System, path: &Path) -> Result<Self> {
        if !system.exists(path) {
            return Ok(Self::default());
        }

        let content = system
            .read_to_string(path)
            .with_context(|| format!("Failed to read transfer state: {}", path.display()))?;

        let state = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse transfer state: {}", path.display()))?;

        Ok(state)
    }

    /// Persist the state document with atomic replace
    pub fn save(&self, system: &dyn System, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize transfer state")?;
        atomic_write(system, path, yaml.as_bytes())
            .with_context(|| format!("Failed to write transfer state: {}", path.display()))?;
        Ok(())
    }

    /// The last commit recorded for `(worker, repo, branch)`, if any
    #[must_use]
    pub fn get(&self, worker: &str, repo: &str, branch: &str) -> Option<&str> {
        self.workers
            .get(worker)?
            .get(repo)?
            .get(branch)
            .map(String::as_str)
    }

    /// Record `commit` as the last synchronized tip for `(worker, repo, branch)`
    pub fn record(&mut self, worker: &str, repo: &str, branch: &str, commit: &str) {
        self.workers
            .entry(worker.to_owned())
            .or_default()
            .entry(repo.to_owned())
            .or_default()
            .insert(branch.to_owned(), commit.to_owned());
    }

    /// Drop every branch record for `(worker, repo)`, reporting whether
    /// any existed
    pub fn clear_repo(&mut self, worker: &str, repo: &str) -> bool {
        self.workers
            .get_mut(worker)
            .is_some_and(|repos| repos.remove(repo).is_some())
    }
}
