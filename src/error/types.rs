//! Custom error types for sync operations

use thiserror::Error;

/// Main error type for repofleet operations
///
/// Every variant maps to exit code 1; the message prefix is what tells the
/// classes apart on the command line.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncError {
    /// Configuration Error - missing or uninitialized stores, bad arguments
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Collision Error - an explicitly requested repo name already maps to a different path
    #[error("Collision error: {message}")]
    Collision { message: String },

    /// Transport Error - the execution/copy channel returned a nonzero status
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Git Error - bundle creation or application failed
    #[error("Git error: {message}")]
    Git { message: String },
}

impl SyncError {
    /// Create a configuration error
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a collision error
    #[inline]
    pub fn collision<S: Into<String>>(message: S) -> Self {
        Self::Collision {
            message: message.into(),
        }
    }

    /// Create a transport error
    #[inline]
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a git error
    #[inline]
    pub fn git<S: Into<String>>(message: S) -> Self {
        Self::Git {
            message: message.into(),
        }
    }
}
