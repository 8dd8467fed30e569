//! Thin helpers over the git binary
//!
//! Git is treated as a black-box version-control engine: every operation
//! shells out through the injected `ProcessRunner` and surfaces git's own
//! stderr unmodified on failure.

use crate::error::SyncError;
use crate::process::{CommandOutput, ProcessRunner, argv};
use anyhow::{Context as _, Result};
use std::path::Path;

/// Verify that the git binary is available
pub fn check_git_availability(runner: &dyn ProcessRunner) -> Result<()> {
    let output = runner
        .run("git", &argv(&["--version"]), None)
        .context("Failed to execute git; is it installed and on PATH?")?;

    if !output.success() {
        return Err(SyncError::git(format!(
            "git --version failed: {}",
            output.stderr.trim()
        ))
        .into());
    }

    Ok(())
}

/// Resolve a revision to a commit id inside `repo_dir`
pub fn rev_parse(runner: &dyn ProcessRunner, repo_dir: &Path, rev: &str) -> Result<String> {
    let output = run_git(runner, repo_dir, &["rev-parse", "--verify", rev])?;

    if !output.success() {
        return Err(SyncError::git(format!(
            "cannot resolve '{}' in {}: {}",
            rev,
            repo_dir.display(),
            output.stderr.trim()
        ))
        .into());
    }

    Ok(output.stdout_trimmed())
}

/// Whether `ancestor` is an ancestor of `descendant` in `repo_dir`
///
/// Any nonzero exit counts as "no": a recorded commit that no longer
/// exists (rewritten history) must degrade to a full bundle, not fail.
pub fn is_ancestor(
    runner: &dyn ProcessRunner,
    repo_dir: &Path,
    ancestor: &str,
    descendant: &str,
) -> Result<bool> {
    let output = run_git(
        runner,
        repo_dir,
        &["merge-base", "--is-ancestor", ancestor, descendant],
    )?;
    Ok(output.success())
}

/// Whether a git repository exists at `path`
pub fn is_git_repo(runner: &dyn ProcessRunner, path: &Path) -> bool {
    let Some(path_str) = path.to_str() else {
        return false;
    };
    runner
        .run("git", &argv(&["-C", path_str, "rev-parse", "--git-dir"]), None)
        .map(|output| output.success())
        .unwrap_or(false)
}

/// Create a bundle file for `range` (either `branch` or `base..branch`)
pub fn create_bundle(
    runner: &dyn ProcessRunner,
    repo_dir: &Path,
    bundle_file: &Path,
    range: &str,
) -> Result<()> {
    let bundle_str = path_str(bundle_file)?;
    let output = run_git(runner, repo_dir, &["bundle", "create", bundle_str, range])?;

    if !output.success() {
        return Err(SyncError::git(format!(
            "failed to create bundle for '{}': {}",
            range,
            output.stderr.trim()
        ))
        .into());
    }

    Ok(())
}

/// Clone `branch` out of a bundle file into `target`
///
/// Returns the raw output so callers can inspect the failure text; cloning
/// is how a first-ever transfer materializes a repository.
pub fn clone_bundle(
    runner: &dyn ProcessRunner,
    bundle_file: &Path,
    branch: &str,
    target: &Path,
) -> Result<CommandOutput> {
    let bundle_str = path_str(bundle_file)?;
    let target_str = path_str(target)?;
    let output = runner
        .run(
            "git",
            &argv(&["clone", "--branch", branch, bundle_str, target_str]),
            None,
        )
        .context("Failed to execute git clone")?;
    Ok(output)
}

/// Name of the branch checked out in `repo_dir` (`HEAD` when detached)
pub fn current_branch(runner: &dyn ProcessRunner, repo_dir: &Path) -> Result<String> {
    let output = run_git(runner, repo_dir, &["rev-parse", "--abbrev-ref", "HEAD"])?;

    if !output.success() {
        return Err(SyncError::git(format!(
            "cannot determine the checked-out branch in {}: {}",
            repo_dir.display(),
            output.stderr.trim()
        ))
        .into());
    }

    Ok(output.stdout_trimmed())
}

/// Fast-forward the checked-out branch of `repo_dir` from a bundle
///
/// `git fetch` refuses to move the current branch of a non-bare
/// repository, so updates to the checked-out branch go through
/// `pull --ff-only`, which also brings the working tree along. Anything
/// but a fast-forward fails with git's own message.
pub fn pull_bundle(
    runner: &dyn ProcessRunner,
    repo_dir: &Path,
    bundle_file: &Path,
    bundle_branch: &str,
) -> Result<()> {
    let bundle_str = path_str(bundle_file)?;
    let output = run_git(
        runner,
        repo_dir,
        &["pull", "--ff-only", bundle_str, bundle_branch],
    )?;

    if !output.success() {
        return Err(SyncError::git(format!(
            "failed to fast-forward from bundle: {}",
            output.stderr.trim()
        ))
        .into());
    }

    Ok(())
}

/// Fetch `bundle_branch` out of a bundle into `refs/heads/<local_branch>`
///
/// The refspec carries no leading `+`, so git rejects non-fast-forward
/// updates and the rejection text reaches the operator verbatim.
pub fn fetch_bundle(
    runner: &dyn ProcessRunner,
    repo_dir: &Path,
    bundle_file: &Path,
    bundle_branch: &str,
    local_branch: &str,
) -> Result<()> {
    let bundle_str = path_str(bundle_file)?;
    let refspec = format!("{bundle_branch}:{local_branch}");
    let output = run_git(runner, repo_dir, &["fetch", bundle_str, &refspec])?;

    if !output.success() {
        return Err(SyncError::git(format!(
            "failed to apply bundle to '{}': {}",
            local_branch,
            output.stderr.trim()
        ))
        .into());
    }

    Ok(())
}

/// Rename a branch inside `repo_dir`
pub fn rename_branch(
    runner: &dyn ProcessRunner,
    repo_dir: &Path,
    from: &str,
    to: &str,
) -> Result<()> {
    let output = run_git(runner, repo_dir, &["branch", "-m", from, to])?;

    if !output.success() {
        return Err(SyncError::git(format!(
            "failed to rename branch '{}' to '{}': {}",
            from,
            to,
            output.stderr.trim()
        ))
        .into());
    }

    Ok(())
}

fn run_git(runner: &dyn ProcessRunner, repo_dir: &Path, args: &[&str]) -> Result<CommandOutput> {
    let output = runner
        .run("git", &argv(args), Some(repo_dir))
        .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;
    Ok(output)
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow::anyhow!("path is not valid UTF-8: {}", path.display()))
}
