//! Send orchestration
//!
//! Drives one local→worker transfer through its steps: parse the refspec,
//! resolve the registry name, build the bundle, transfer, apply remotely,
//! record transfer state. Any step's failure ends the operation; the local
//! bundle lives in a `TempDir` scoped to this call and the worker-side
//! staging directory is removed best-effort on every exit path.

use crate::bundle::{self, BranchSpec, BundlePlan, MISSING_REPO_MARKER};
use crate::channel::{Channel, remote_failure};
use crate::config::StorePaths;
use crate::error::SyncError;
use crate::git;
use crate::process::{ProcessRunner, argv};
use crate::refspec::Refspec;
use crate::registry::{ConflictResolver, Registry};
use crate::state::TransferState;
use crate::system::System;
use crate::workers::{Endpoint, WorkerDirectory};
use anyhow::{Context as _, Result};
use std::path::Path;
use tempfile::TempDir;
use tracing::{info, warn};

/// Parameters of one send invocation
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub worker: String,
    pub refspec: String,
    pub force_full: bool,
}

/// Send a branch of the current directory's repository to a worker
pub fn send(
    system: &dyn System,
    runner: &dyn ProcessRunner,
    resolver: &dyn ConflictResolver,
    request: &SendRequest,
) -> Result<()> {
    // Parse the refspec against the current directory name
    let repo_dir = system
        .current_dir()
        .context("Cannot determine the current directory")?;
    let default_name = repo_dir
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

    // Resolve the registry name
    let paths = StorePaths::resolve(system)?;
    let mut registry = Registry::load(system, &paths.registry_file())?;
    let directory = WorkerDirectory::load(system, &paths.workers_file())?;
    let endpoint = directory.endpoint(&request.worker);

    git::check_git_availability(runner)?;
    if !git::is_git_repo(runner, &repo_dir) {
        return Err(SyncError::git(format!(
            "{} is not a git repository",
            repo_dir.display()
        ))
        .into());
    }

    let repo_name = registry.resolve_for_send(
        &request.worker,
        endpoint.known,
        &spec.repo_name,
        &repo_dir,
        spec.explicit_name,
        resolver,
    )?;
    if endpoint.known {
        registry.save(system, &paths.registry_file())?;
    }

    // Build the bundle
    let mut state = TransferState::load(system, &paths.state_file())?;
    let last_sent = if endpoint.known {
        state
            .get(&request.worker, &repo_name, &spec.local_branch)
            .map(str::to_owned)
    } else {
        None
    };
    let tip = git::rev_parse(runner, &repo_dir, &spec.local_branch)?;
    let plan = bundle::plan_bundle(
        runner,
        &repo_dir,
        &spec.local_branch,
        last_sent.as_deref(),
        request.force_full,
    )?;

    let staging = TempDir::new().context("Failed to create a staging directory")?;
    let bundle_file = staging.path().join(format!("{repo_name}.bundle"));
    bundle::create_bundle_file(runner, &repo_dir, &spec.local_branch, &plan, &bundle_file)?;

    // Transfer and apply, with the remote staging dir removed on every path
    let channel = Channel::new(runner);
    let remote_dir = super::remote_staging_dir();
    let remote_bundle = format!("{}/{}.bundle", remote_dir, repo_name);
    channel.run_checked(&endpoint, &argv(&["mkdir", "-p", remote_dir.as_str()]))?;

    let result = transfer_and_apply(
        runner,
        &channel,
        &endpoint,
        &repo_dir,
        &spec,
        &plan,
        &bundle_file,
        &remote_bundle,
    );
    cleanup_remote(&channel, &endpoint, &remote_dir);
    let fell_back_to_full = result?;

    // Record the new transfer state
    if endpoint.known {
        state.record(&request.worker, &repo_name, &spec.local_branch, &tip);
        state.save(system, &paths.state_file())?;
    }

    info!(
        "Sent '{}' to {} as '{}' (branch '{}', {})",
        spec.local_branch,
        request.worker,
        repo_name,
        spec.remote_branch,
        if plan.is_incremental() && !fell_back_to_full {
            "incremental"
        } else {
            "full"
        },
    );
    Ok(())
}

/// Copy the bundle over and apply it remotely, retrying once with a full
/// bundle when the worker reports no repository at the target path.
/// Returns whether that fallback was taken.
#[expect(clippy::too_many_arguments, reason = "one call site")]
fn transfer_and_apply(
    runner: &dyn ProcessRunner,
    channel: &Channel<'_>,
    endpoint: &Endpoint,
    repo_dir: &Path,
    spec: &Refspec,
    plan: &BundlePlan,
    bundle_file: &Path,
    remote_bundle: &str,
) -> Result<bool> {
    channel.copy_to(endpoint, bundle_file, remote_bundle)?;

    let apply_command = apply_command(endpoint, spec, remote_bundle);
    let output = channel.run(endpoint, &apply_command)?;
    if output.success() {
        return Ok(false);
    }

    let remote_text = format!("{}\n{}", output.stdout, output.stderr);
    if plan.is_incremental() && remote_text.contains(MISSING_REPO_MARKER) {
        warn!(
            "Worker '{}' has no repository for this bundle; falling back to a full bundle",
            endpoint.host
        );
        bundle::create_bundle_file(
            runner,
            repo_dir,
            &spec.local_branch,
            &BundlePlan::Full,
            bundle_file,
        )?;
        channel.copy_to(endpoint, bundle_file, remote_bundle)?;

        let output = channel.run(endpoint, &apply_command)?;
        if output.success() {
            return Ok(true);
        }
        return Err(remote_failure(&endpoint.host, &output).into());
    }

    Err(remote_failure(&endpoint.host, &output).into())
}

fn apply_command(endpoint: &Endpoint, spec: &Refspec, remote_bundle: &str) -> Vec<String> {
    let branch_spec = BranchSpec {
        bundle_branch: spec.local_branch.clone(),
        local_branch: spec.remote_branch.clone(),
    };

    let mut command = vec![
        "repofleet".to_owned(),
        "apply".to_owned(),
        remote_bundle.to_owned(),
        branch_spec.render(),
    ];
    if let Some(base) = &endpoint.base_path {
        command.push("--base-path".to_owned());
        command.push(base.clone());
    }
    command
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
