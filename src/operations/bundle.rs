//! Remote bundle building
//!
//! Entry point behind `repofleet bundle`, invoked on a worker by the fetch
//! orchestrator. Always builds a full bundle: incremental history is only
//! tracked for the send direction.

use crate::bundle::{BundlePlan, create_bundle_file};
use crate::error::SyncError;
use crate::git;
use crate::process::ProcessRunner;
use crate::system::System;
use anyhow::Result;
use std::path::PathBuf;

/// Parameters of one bundle invocation
#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub repo_name: String,
    pub branch: String,
    pub output: PathBuf,
    pub base_path: Option<String>,
}

/// Build a full bundle of a named repo's branch
pub fn bundle(system: &dyn System, runner: &dyn ProcessRunner, request: &BundleRequest) -> Result<()> {
    let base_path = match request.base_path.as_deref() {
        Some(base) => super::expand_tilde(system, base),
        None => super::default_base_path(system)?,
    };
    let repo_dir = base_path.join(&request.repo_name);

    if !git::is_git_repo(runner, &repo_dir) {
        return Err(SyncError::git(format!(
            "no repository for '{}' at {}",
            request.repo_name,
            repo_dir.display()
        ))
        .into());
    }

    create_bundle_file(
        runner,
        &repo_dir,
        &request.branch,
        &BundlePlan::Full,
        &request.output,
    )
}
