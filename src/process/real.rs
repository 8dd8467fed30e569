//! Real process runner using `std::process::Command`

use super::{CommandOutput, ProcessRunner};
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Production implementation of `ProcessRunner`
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new `SystemRunner` instance
    #[must_use]
    pub const fn new() -> Self {
        return Self;
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], cwd: Option<&Path>) -> io::Result<CommandOutput> {
        debug!("Running: {} {}", program, args.join(" "));

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code().unwrap_or(-1),
        })
    }
}
