//! Bundle applier (receiving side)
//!
//! Runs on whichever machine receives a bundle: the worker during a send,
//! the coordinating machine during a fetch.

use crate::error::SyncError;
use crate::git;
use crate::process::ProcessRunner;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Marker surfaced when a bundle arrives for a path with no repository
///
/// The sending side matches on this text to fall back to a full bundle;
/// an incremental bundle cannot seed a clone.
pub const MISSING_REPO_MARKER: &str = "repofleet: no existing repository";

/// Parsed `<bundle_branch>[:<local_branch>]` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSpec {
    pub bundle_branch: String,
    pub local_branch: String,
}

impl BranchSpec {
    /// Parse a branch spec; without a `:` the local branch keeps the
    /// bundle's name.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        match input.split_once(':') {
            Some((bundle, local)) => Self {
                bundle_branch: bundle.to_owned(),
                local_branch: local.to_owned(),
            },
            None => Self {
                bundle_branch: input.to_owned(),
                local_branch: input.to_owned(),
            },
        }
    }

    /// Render back to the compact `bundle[:local]` form
    #[must_use]
    pub fn render(&self) -> String {
        if self.bundle_branch == self.local_branch {
            return self.bundle_branch.clone();
        }
        return format!("{}:{}", self.bundle_branch, self.local_branch);
    }
}

/// What applying a bundle did to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new repository was cloned out of the bundle
    Cloned,
    /// An existing branch was fast-forwarded
    Updated,
}

/// Resolve the target path for an apply invocation
///
/// Explicit path wins; otherwise the repo lands at
/// `<base_path>/<repo_name>` with the repo name taken from the bundle
/// file's stem (the sender names the transferred bundle
/// `<repo_name>.bundle`).
pub fn resolve_target(
    bundle_file: &Path,
    explicit_path: Option<&Path>,
    base_path: &Path,
) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(path.to_path_buf());
    }

    let repo_name = bundle_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            return SyncError::configuration(format!(
                "cannot derive a repo name from bundle file '{}'; pass --path",
                bundle_file.display()
            ));
        })?;

    Ok(base_path.join(repo_name))
}

/// Apply a bundle at `target`: clone when no repository exists there,
/// fast-forward the branch when one does
///
/// A non-fast-forward result fails loudly with git's own rejection text;
/// this subsystem never discards commits that exist only on the receiving
/// side.
pub fn apply_bundle(
    runner: &dyn ProcessRunner,
    bundle_file: &Path,
    spec: &BranchSpec,
    target: &Path,
) -> Result<ApplyOutcome> {
    if git::is_git_repo(runner, target) {
        // The checked-out branch cannot be moved by a plain fetch
        if git::current_branch(runner, target)? == spec.local_branch {
            git::pull_bundle(runner, target, bundle_file, &spec.bundle_branch)?;
        } else {
            git::fetch_bundle(
                runner,
                target,
                bundle_file,
                &spec.bundle_branch,
                &spec.local_branch,
            )?;
        }
        info!(
            "Updated '{}' at {} from bundle",
            spec.local_branch,
            target.display()
        );
        return Ok(ApplyOutcome::Updated);
    }

    let output = git::clone_bundle(runner, bundle_file, &spec.bundle_branch, target)?;
    if !output.success() {
        return Err(SyncError::git(format!(
            "{} at {}; cannot apply bundle: {}",
            MISSING_REPO_MARKER,
            target.display(),
            output.stderr.trim()
        ))
        .into());
    }

    if spec.local_branch != spec.bundle_branch {
        git::rename_branch(runner, target, &spec.bundle_branch, &spec.local_branch)?;
    }

    info!(
        "Cloned '{}' into {} from bundle",
        spec.local_branch,
        target.display()
    );
    Ok(ApplyOutcome::Cloned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::FakeRunner;

    #[test]
    fn test_branch_spec_parsing() {
        assert_eq!(
            BranchSpec::parse("main"),
            BranchSpec {
                bundle_branch: "main".to_owned(),
                local_branch: "main".to_owned(),
            }
        );
        assert_eq!(
            BranchSpec::parse("main:dev"),
            BranchSpec {
                bundle_branch: "main".to_owned(),
                local_branch: "dev".to_owned(),
            }
        );
        assert_eq!(BranchSpec::parse("main:dev").render(), "main:dev");
        assert_eq!(BranchSpec::parse("main").render(), "main");
    }

    #[test]
    fn test_resolve_target_from_bundle_stem() {
        let target = resolve_target(
            Path::new("/tmp/proj1.bundle"),
            None,
            Path::new("/home/u/repos"),
        )
        .unwrap();
        assert_eq!(target, PathBuf::from("/home/u/repos/proj1"));
    }

    #[test]
    fn test_resolve_target_explicit_path_wins() {
        let target = resolve_target(
            Path::new("/tmp/proj1.bundle"),
            Some(Path::new("/srv/elsewhere")),
            Path::new("/home/u/repos"),
        )
        .unwrap();
        assert_eq!(target, PathBuf::from("/srv/elsewhere"));
    }

    #[test]
    fn test_existing_repo_is_fetched_not_cloned() {
        let runner = FakeRunner::new()
            .on("rev-parse --git-dir", 0, ".git\n", "")
            .on("rev-parse --abbrev-ref HEAD", 0, "other\n", "");
        let spec = BranchSpec::parse("main:dev");

        let outcome =
            apply_bundle(&runner, Path::new("/tmp/p.bundle"), &spec, Path::new("/repo")).unwrap();

        assert_eq!(outcome, ApplyOutcome::Updated);
        assert!(runner.ran("fetch /tmp/p.bundle main:dev"));
        assert!(!runner.ran("clone"));
    }

    #[test]
    fn test_checked_out_branch_is_pulled_fast_forward_only() {
        let runner = FakeRunner::new()
            .on("rev-parse --git-dir", 0, ".git\n", "")
            .on("rev-parse --abbrev-ref HEAD", 0, "dev\n", "");
        let spec = BranchSpec::parse("main:dev");

        let outcome =
            apply_bundle(&runner, Path::new("/tmp/p.bundle"), &spec, Path::new("/repo")).unwrap();

        assert_eq!(outcome, ApplyOutcome::Updated);
        assert!(runner.ran("pull --ff-only /tmp/p.bundle main"));
        assert!(!runner.ran("fetch"));
    }

    #[test]
    fn test_missing_repo_is_cloned() {
        let runner = FakeRunner::new().on("rev-parse --git-dir", 128, "", "fatal: not a git repository\n");
        let spec = BranchSpec::parse("main");

        let outcome =
            apply_bundle(&runner, Path::new("/tmp/p.bundle"), &spec, Path::new("/new")).unwrap();

        assert_eq!(outcome, ApplyOutcome::Cloned);
        assert!(runner.ran("clone --branch main /tmp/p.bundle /new"));
    }

    #[test]
    fn test_clone_with_rename_moves_branch() {
        let runner = FakeRunner::new().on("rev-parse --git-dir", 128, "", "");
        let spec = BranchSpec::parse("main:work");

        apply_bundle(&runner, Path::new("/tmp/p.bundle"), &spec, Path::new("/new")).unwrap();

        assert!(runner.ran("branch -m main work"));
    }

    #[test]
    fn test_failed_clone_reports_missing_repo_marker() {
        let runner = FakeRunner::new()
            .on("rev-parse --git-dir", 128, "", "")
            .on(
                "clone",
                128,
                "",
                "error: Repository lacks these prerequisite commits:\nerror: abc123\n",
            );
        let spec = BranchSpec::parse("main");

        let err = apply_bundle(&runner, Path::new("/tmp/p.bundle"), &spec, Path::new("/new"))
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains(MISSING_REPO_MARKER));
        assert!(message.contains("prerequisite"));
    }

    #[test]
    fn test_non_fast_forward_surfaces_git_rejection() {
        let runner = FakeRunner::new().on("rev-parse --git-dir", 0, ".git\n", "").on(
            "fetch",
            1,
            "",
            "! [rejected] main -> main (non-fast-forward)\n",
        );
        let spec = BranchSpec::parse("main");

        let err = apply_bundle(&runner, Path::new("/tmp/p.bundle"), &spec, Path::new("/repo"))
            .unwrap_err();

        assert!(err.to_string().contains("non-fast-forward"));
    }
}
