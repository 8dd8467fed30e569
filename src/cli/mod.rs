//! Command-line interface module

pub mod args;

pub use args::*;
