//! # repofleet
//!
//! Synchronize git repositories between a coordinating machine and a fleet
//! of independently addressed worker machines. Repositories are identified
//! by a per-worker logical name rather than a filesystem path, and
//! transferred data is minimized with incremental git bundles.
//!
//! ## Usage
//!
//! **Send the current repository's `main` branch to worker `alpha`:**
//! ```sh
//! repofleet send alpha main
//! ```
//!
//! **Send under an explicit name, into a differently named remote branch:**
//! ```sh
//! repofleet send alpha main:app@dev
//! ```
//!
//! **Fetch it back:**
//! ```sh
//! repofleet fetch alpha main:app@dev
//! ```
//!
//! See `repofleet --help` for the registry maintenance commands.

use anyhow::Result;
use clap::Parser as _;
use repofleet::cli::Args;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber based on verbose flag
    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_target(false).with_env_filter(filter).init();

    match repofleet::run(args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    }
}
