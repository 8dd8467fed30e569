//! System abstraction for environment and filesystem operations
//!
//! This module provides a unified trait for the external system interactions
//! the stores depend on, allowing for easy testing with mock implementations.

use std::env::VarError;
use std::io;
use std::path::{Path, PathBuf};

pub mod mock;
pub mod real;

pub use mock::MockSystem;
pub use real::RealSystem;

/// Unified trait for system operations (environment + filesystem)
///
/// # Implementations
/// - `RealSystem`: Production implementation using `std::env` and `std::fs`
/// - `MockSystem`: Test implementation using in-memory storage
pub trait System: Send + Sync {
    // ==================== Environment Operations ====================

    /// Get an environment variable
    fn env_var(&self, key: &str) -> Result<String, VarError>;

    /// Get the current working directory
    fn current_dir(&self) -> io::Result<PathBuf>;

    /// Get the user's home directory, if one can be determined
    fn home_dir(&self) -> Option<PathBuf>;

    /// Get the user's configuration directory, if one can be determined
    fn config_dir(&self) -> Option<PathBuf>;

    // ==================== Filesystem Operations ====================

    /// Read entire file contents as a string
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write bytes to a file, creating it if it doesn't exist
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Recursively create a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Rename a file, replacing the destination if it exists
    ///
    /// Atomic on POSIX filesystems when source and destination share a
    /// parent directory; the stores rely on this for crash-safe updates.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;
}
