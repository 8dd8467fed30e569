//! Error handling module
//!
//! Defines the error taxonomy shared by all sync operations

pub mod types;

pub use types::*;
