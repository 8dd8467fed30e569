//! Remote execution channel
//!
//! The opaque channel the protocol runs over: run a command on a host,
//! copy a file to or from a host. Implemented with the system ssh/scp
//! binaries through the injected `ProcessRunner`; everything above this
//! module is transport-agnostic.

use crate::error::SyncError;
use crate::process::{CommandOutput, ProcessRunner};
use crate::workers::Endpoint;
use anyhow::{Context as _, Result};
use std::path::Path;
use tracing::debug;

/// Channel to one endpoint, borrowing the process runner
pub struct Channel<'a> {
    runner: &'a dyn ProcessRunner,
}

impl<'a> Channel<'a> {
    /// Create a channel over the given runner
    #[must_use]
    pub fn new(runner: &'a dyn ProcessRunner) -> Self {
        Self { runner }
    }

    /// Run a command on the endpoint's host, blocking until it exits
    ///
    /// A nonzero remote exit is NOT an error here; the raw output is
    /// returned so callers can inspect remote messages before deciding.
    /// Spawn failures (no ssh binary) are errors.
    pub fn run(&self, endpoint: &Endpoint, command: &[String]) -> Result<CommandOutput> {
        let mut args = identity_args(endpoint);
        args.push(endpoint.host.clone());
        args.extend(command.iter().cloned());

        debug!("ssh {}: {}", endpoint.host, command.join(" "));
        let output = self
            .runner
            .run("ssh", &args, None)
            .with_context(|| format!("Failed to execute ssh to {}", endpoint.host))?;
        Ok(output)
    }

    /// Run a command on the endpoint's host, failing on nonzero exit
    pub fn run_checked(&self, endpoint: &Endpoint, command: &[String]) -> Result<CommandOutput> {
        let output = self.run(endpoint, command)?;
        if !output.success() {
            return Err(remote_failure(&endpoint.host, &output).into());
        }
        Ok(output)
    }

    /// Copy a local file to a path on the endpoint's host
    pub fn copy_to(&self, endpoint: &Endpoint, local: &Path, remote: &str) -> Result<()> {
        let mut args = identity_args(endpoint);
        args.push(local.display().to_string());
        args.push(format!("{}:{}", endpoint.host, remote));

        debug!("scp {} -> {}:{}", local.display(), endpoint.host, remote);
        let output = self
            .runner
            .run("scp", &args, None)
            .with_context(|| format!("Failed to execute scp to {}", endpoint.host))?;

        if !output.success() {
            return Err(remote_failure(&endpoint.host, &output).into());
        }
        Ok(())
    }

    /// Copy a file from the endpoint's host to a local path
    pub fn copy_from(&self, endpoint: &Endpoint, remote: &str, local: &Path) -> Result<()> {
        let mut args = identity_args(endpoint);
        args.push(format!("{}:{}", endpoint.host, remote));
        args.push(local.display().to_string());

        debug!("scp {}:{} -> {}", endpoint.host, remote, local.display());
        let output = self
            .runner
            .run("scp", &args, None)
            .with_context(|| format!("Failed to execute scp from {}", endpoint.host))?;

        if !output.success() {
            return Err(remote_failure(&endpoint.host, &output).into());
        }
        Ok(())
    }
}

fn identity_args(endpoint: &Endpoint) -> Vec<String> {
    match &endpoint.identity {
        Some(identity) => vec!["-i".to_owned(), identity.display().to_string()],
        None => Vec::new(),
    }
}

/// Build the transport error for a nonzero remote status, with the remote
/// output propagated verbatim
pub fn remote_failure(host: &str, output: &CommandOutput) -> SyncError {
    let mut detail = output.stderr.trim().to_owned();
    if detail.is_empty() {
        detail = output.stdout.trim().to_owned();
    }
    SyncError::transport(format!(
        "command on {} exited with status {}: {}",
        host, output.code, detail
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::FakeRunner;
    use std::path::PathBuf;

    fn endpoint_with_identity() -> Endpoint {
        Endpoint {
            host: "alpha.fleet".to_owned(),
            identity: Some(PathBuf::from("/keys/id_ed25519")),
            base_path: None,
            known: true,
        }
    }

    #[test]
    fn test_run_includes_identity_and_host() {
        let runner = FakeRunner::new();
        let channel = Channel::new(&runner);

        channel
            .run(&endpoint_with_identity(), &["echo".to_owned(), "ok".to_owned()])
            .unwrap();

        assert!(runner.ran("ssh -i /keys/id_ed25519 alpha.fleet echo ok"));
    }

    #[test]
    fn test_copy_to_builds_scp_destination() {
        let runner = FakeRunner::new();
        let channel = Channel::new(&runner);

        channel
            .copy_to(
                &endpoint_with_identity(),
                Path::new("/tmp/proj.bundle"),
                "/tmp/repofleet/proj.bundle",
            )
            .unwrap();

        assert!(runner.ran("scp -i /keys/id_ed25519 /tmp/proj.bundle alpha.fleet:/tmp/repofleet/proj.bundle"));
    }

    #[test]
    fn test_nonzero_copy_is_transport_error() {
        let runner = FakeRunner::new().on("scp", 1, "", "scp: connection refused\n");
        let channel = Channel::new(&runner);

        let err = channel
            .copy_from(
                &endpoint_with_identity(),
                "/tmp/x.bundle",
                Path::new("/tmp/x.bundle"),
            )
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Transport error"));
        assert!(message.contains("connection refused"));
    }
}
