//! Worker directory
//!
//! Read-only lookup from worker name to connection details. The directory
//! is owned elsewhere (operators provision it as `workers.yaml` in the
//! store directory); this subsystem only consumes it. A missing file is an
//! empty directory, and an unknown worker degrades rather than fails: the
//! name itself is used as the ssh host.

use crate::system::System;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A single worker's connection details
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Worker {
    /// Hostname or ssh alias
    pub host: String,
    /// Private key passed to ssh/scp with `-i`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<PathBuf>,
    /// Worker-side directory under which repos live; the remote applier's
    /// default (`~/repos`) applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
}

/// The worker directory document, keyed by worker name
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(transparent)]
pub struct WorkerDirectory {
    workers: BTreeMap<String, Worker>,
}

/// Resolved connection endpoint for one transfer
///
/// `known` records whether the worker was found in the directory; sends to
/// unknown workers skip registry and transfer-state bookkeeping.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub identity: Option<PathBuf>,
    pub base_path: Option<String>,
    pub known: bool,
}

impl WorkerDirectory {
    /// Load the directory; a missing file yields an empty directory
    pub fn load(system: &dyn System, path: &Path) -> Result<Self> {
        if !system.exists(path) {
            return Ok(Self::default());
        }

        let content = system
            .read_to_string(path)
            .with_context(|| format!("Failed to read worker directory: {}", path.display()))?;

        let directory = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse worker directory: {}", path.display()))?;

        Ok(directory)
    }

    /// Look up a worker by name
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Worker> {
        self.workers.get(name)
    }

    /// Resolve connection details for `name`, degrading to the bare name
    /// as host when the worker is unknown
    #[must_use]
    pub fn endpoint(&self, name: &str) -> Endpoint {
        match self.lookup(name) {
            Some(worker) => Endpoint {
                host: worker.host.clone(),
                identity: worker.identity.clone(),
                base_path: worker.base_path.clone(),
                known: true,
            },
            None => Endpoint {
                host: name.to_owned(),
                identity: None,
                base_path: None,
                known: false,
            },
        }
    }
}
