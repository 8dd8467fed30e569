//! Bundle builder (send direction)

use crate::git;
use crate::process::ProcessRunner;
use anyhow::Result;
use std::path::Path;
use tracing::debug;

/// How much history the next bundle must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundlePlan {
    /// Everything reachable from the branch, from its root
    Full,
    /// Only commits in `base..branch`
    Incremental { base: String },
}

impl BundlePlan {
    /// The git revision range realizing this plan for `branch`
    #[must_use]
    pub fn range(&self, branch: &str) -> String {
        match self {
            Self::Full => branch.to_owned(),
            Self::Incremental { base } => format!("{base}..{branch}"),
        }
    }

    /// Whether this plan depends on commits already present remotely
    #[must_use]
    pub const fn is_incremental(&self) -> bool {
        matches!(self, Self::Incremental { .. })
    }
}

/// Decide between an incremental and a full bundle
///
/// Incremental requires a recorded base that is still an ancestor of the
/// branch tip; everything else (no prior state, forced full, rewritten
/// history) degrades to a full bundle.
pub fn plan_bundle(
    runner: &dyn ProcessRunner,
    repo_dir: &Path,
    branch: &str,
    last_sent: Option<&str>,
    force_full: bool,
) -> Result<BundlePlan> {
    if force_full {
        debug!("Full bundle forced for '{}'", branch);
        return Ok(BundlePlan::Full);
    }

    let Some(base) = last_sent else {
        debug!("No transfer state for '{}'; building full bundle", branch);
        return Ok(BundlePlan::Full);
    };

    if git::is_ancestor(runner, repo_dir, base, branch)? {
        debug!("Incremental bundle from {} to '{}'", base, branch);
        return Ok(BundlePlan::Incremental {
            base: base.to_owned(),
        });
    }

    debug!(
        "Recorded base {} is not an ancestor of '{}'; building full bundle",
        base, branch
    );
    Ok(BundlePlan::Full)
}

/// Materialize the planned bundle at `bundle_file`
pub fn create_bundle_file(
    runner: &dyn ProcessRunner,
    repo_dir: &Path,
    branch: &str,
    plan: &BundlePlan,
    bundle_file: &Path,
) -> Result<()> {
    git::create_bundle(runner, repo_dir, bundle_file, &plan.range(branch))
}
