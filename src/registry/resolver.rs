//! Pluggable collision resolution
//!
//! When a defaulted repo name is already taken by a different path, the
//! registry asks a `ConflictResolver` for an alternate name. The default
//! implementation prompts on the terminal; the non-interactive one fails
//! fast so scripted runs never hang on a prompt.

use crate::error::SyncError;
use anyhow::Result;
use std::io::{self, BufRead as _, Write as _};
use std::path::Path;

/// Capability for resolving repo-name collisions
pub trait ConflictResolver {
    /// Propose a replacement for `candidate`, which is already registered
    /// for `taken_by`. Called repeatedly until the returned name is
    /// acceptable to the registry.
    fn resolve_name_conflict(&self, candidate: &str, taken_by: &Path) -> Result<String>;
}

/// Interactive resolver reading an alternate name from stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractiveResolver;

impl ConflictResolver for InteractiveResolver {
    fn resolve_name_conflict(&self, candidate: &str, taken_by: &Path) -> Result<String> {
        eprintln!(
            "Repo name '{}' is already registered for {}",
            candidate,
            taken_by.display()
        );
        eprint!("Enter an alternate name: ");
        io::stderr().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        return Ok(line.trim().to_owned());
    }
}

/// Fail-fast resolver for non-interactive runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractiveResolver;

impl ConflictResolver for NonInteractiveResolver {
    fn resolve_name_conflict(&self, candidate: &str, taken_by: &Path) -> Result<String> {
        Err(SyncError::collision(format!(
            "repo name '{}' is already registered for {}; \
             pass an explicit name in the refspec or run interactively",
            candidate,
            taken_by.display()
        ))
        .into())
    }
}
