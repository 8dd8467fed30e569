//! Apply operation
//!
//! Entry point behind `repofleet apply`, which normally runs on a worker
//! at the receiving end of a send, and is reused locally by fetch.

use crate::bundle::{self, BranchSpec};
use crate::process::ProcessRunner;
use crate::system::System;
use anyhow::Result;
use std::path::PathBuf;

/// Parameters of one apply invocation
#[derive(Debug, Clone)]
pub struct ApplyRequest {
    pub bundle_file: PathBuf,
    pub branch_spec: String,
    pub explicit_path: Option<PathBuf>,
    pub base_path: Option<String>,
}

/// Apply a received bundle at its target path
pub fn apply(system: &dyn System, runner: &dyn ProcessRunner, request: &ApplyRequest) -> Result<()> {
    let base_path = resolve_base(system, request.base_path.as_deref())?;
    let target = bundle::resolve_target(
        &request.bundle_file,
        request.explicit_path.as_deref(),
        &base_path,
    )?;

    let spec = BranchSpec::parse(&request.branch_spec);
    bundle::apply_bundle(runner, &request.bundle_file, &spec, &target)?;
    Ok(())
}

fn resolve_base(system: &dyn System, base_path: Option<&str>) -> Result<PathBuf> {
    match base_path {
        Some(base) => Ok(super::expand_tilde(system, base)),
        None => super::default_base_path(system),
    }
}
