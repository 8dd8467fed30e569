//! Fetch orchestration
//!
//! The mirror image of send: the bundle builder runs on the worker, the
//! bundle travels back over the channel, and the applier runs locally
//! against the path the registry records for `(worker, repo_name)`. No
//! transfer state is tracked in this direction; the coordinating machine
//! is the source of truth, so the worker always ships a full bundle.

use crate::bundle::{self, BranchSpec};
use crate::channel::Channel;
use crate::config::StorePaths;
use crate::error::SyncError;
use crate::git;
use crate::process::{ProcessRunner, argv};
use crate::refspec::Refspec;
use crate::registry::Registry;
use crate::system::System;
use crate::workers::{Endpoint, WorkerDirectory};
use anyhow::{Context as _, Result};
use std::path::Path;
use tempfile::TempDir;
use tracing::{info, warn};

/// Parameters of one fetch invocation
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub worker: String,
    pub refspec: String,
}

/// Fetch a branch of a worker's repository back into its registered local
/// path
pub fn fetch(system: &dyn System, runner: &dyn ProcessRunner, request: &FetchRequest) -> Result<()> {
    // Parse the refspec against the current directory name
    let current_dir = system
        .current_dir()
        .context("Cannot determine the current directory")?;
    let default_name = current_dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
        .to_owned();
    let spec = Refspec::parse(&request.refspec, &default_name);

    if spec.local_branch.is_empty() {
        return Err(SyncError::configuration(format!(
            "refspec '{}' names no local branch",
            request.refspec
        ))
        .into());
    }

    git::check_git_availability(runner)?;

    // Fetch only targets already-registered repos
    let paths = StorePaths::resolve(system)?;
    let registry = Registry::load(system, &paths.registry_file())?;
    let target = registry
        .lookup(&request.worker, &spec.repo_name)
        .ok_or_else(|| {
            return SyncError::configuration(format!(
                "no repo named '{}' is registered for worker '{}'; \
                 send it first or register the mapping",
                spec.repo_name, request.worker
            ));
        })?
        .to_path_buf();

    let directory = WorkerDirectory::load(system, &paths.workers_file())?;
    let endpoint = directory.endpoint(&request.worker);
    if !endpoint.known {
        warn!(
            "Worker '{}' is not in the worker directory; using the name as host",
            request.worker
        );
    }

    // Build remotely, copy back, apply locally; remote staging is
    // removed on every path
    let channel = Channel::new(runner);
    let remote_dir = super::remote_staging_dir();
    let remote_bundle = format!("{}/{}.bundle", remote_dir, spec.repo_name);
    channel.run_checked(&endpoint, &argv(&["mkdir", "-p", remote_dir.as_str()]))?;

    let staging = TempDir::new().context("Failed to create a staging directory")?;
    let local_bundle = staging.path().join(format!("{}.bundle", spec.repo_name));

    let result = build_and_pull(
        runner,
        &channel,
        &endpoint,
        &spec,
        &remote_bundle,
        &local_bundle,
        &target,
    );
    cleanup_remote(&channel, &endpoint, &remote_dir);
    result?;

    info!(
        "Fetched '{}' of '{}' from {} into {} (branch '{}')",
        spec.remote_branch,
        spec.repo_name,
        request.worker,
        target.display(),
        spec.local_branch,
    );
    Ok(())
}

fn build_and_pull(
    runner: &dyn ProcessRunner,
    channel: &Channel<'_>,
    endpoint: &Endpoint,
    spec: &Refspec,
    remote_bundle: &str,
    local_bundle: &Path,
    target: &Path,
) -> Result<()> {
    let mut command = vec![
        "repofleet".to_owned(),
        "bundle".to_owned(),
        spec.repo_name.clone(),
        spec.remote_branch.clone(),
        "--output".to_owned(),
        remote_bundle.to_owned(),
    ];
    if let Some(base) = &endpoint.base_path {
        command.push("--base-path".to_owned());
        command.push(base.clone());
    }
    channel.run_checked(endpoint, &command)?;

    channel.copy_from(endpoint, remote_bundle, local_bundle)?;

    let branch_spec = BranchSpec {
        bundle_branch: spec.remote_branch.clone(),
        local_branch: spec.local_branch.clone(),
    };
    bundle::apply_bundle(runner, local_bundle, &branch_spec, target)?;
    Ok(())
}

fn cleanup_remote(channel: &Channel<'_>, endpoint: &Endpoint, remote_dir: &str) {
    match channel.run(endpoint, &argv(&["rm", "-rf", remote_dir])) {
        Ok(output) if output.success() => {}
        Ok(output) => warn!(
            "Could not remove {} on {}: {}",
            remote_dir,
            endpoint.host,
            output.stderr.trim()
        ),
        Err(err) => warn!(
            "Could not remove {} on {}: {}",
            remote_dir, endpoint.host, err
        ),
    }
}
