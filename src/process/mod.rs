//! Process execution capability
//!
//! Narrow seam over external command invocation so the incremental-vs-full
//! and clone-vs-fetch decision logic can be tested against a scripted
//! runner without real git repositories or live ssh connections.

use std::io;
use std::path::Path;

pub mod fake;
pub mod real;

pub use fake::FakeRunner;
pub use real::SystemRunner;

/// Captured output of a finished process
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl CommandOutput {
    /// Whether the process exited with status zero
    #[must_use]
    pub const fn success(&self) -> bool {
        self.code == 0
    }

    /// Trimmed stdout, the usual shape for single-value git queries
    #[must_use]
    pub fn stdout_trimmed(&self) -> String {
        return self.stdout.trim().to_owned();
    }
}

/// Trait for running external processes
///
/// # Implementations
/// - `SystemRunner`: Production implementation using `std::process::Command`
/// - `FakeRunner`: Test implementation replaying scripted responses
pub trait ProcessRunner: Send + Sync {
    /// Run a program with arguments, optionally in a working directory,
    /// blocking until it exits.
    ///
    /// A nonzero exit status is NOT an error at this layer; callers decide
    /// what a failure means. `Err` is reserved for spawn failures (binary
    /// not found, permissions).
    fn run(&self, program: &str, args: &[String], cwd: Option<&Path>) -> io::Result<CommandOutput>;
}

/// Convenience for building argument vectors from `&str` slices
#[must_use]
pub fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| (*arg).to_owned()).collect()
}
