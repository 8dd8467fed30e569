//! repofleet - synchronize git repositories between a coordinating machine
//! and a fleet of worker machines
//!
//! Repositories are addressed by a per-worker logical name instead of a
//! filesystem path, and transfers ship incremental git bundles over an
//! ssh/scp channel whenever the recorded transfer state allows it.

pub mod bundle;
pub mod channel;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod operations;
pub mod process;
pub mod refspec;
pub mod registry;
pub mod state;
pub mod system;
pub mod workers;

use anyhow::Result;
use cli::{Args, Command};
use operations::apply::ApplyRequest;
use operations::bundle::BundleRequest;
use operations::fetch::FetchRequest;
use operations::send::SendRequest;
use process::SystemRunner;
use registry::{ConflictResolver, InteractiveResolver, NonInteractiveResolver};
use system::RealSystem;

/// Main entry point for the repofleet library
pub fn run(args: Args) -> Result<()> {
    let system = RealSystem::new();
    let runner = SystemRunner::new();

    let resolver: Box<dyn ConflictResolver> = if args.non_interactive {
        Box::new(NonInteractiveResolver)
    } else {
        Box::new(InteractiveResolver)
    };

    match args.command {
        Command::Init => operations::admin::init(&system),
        Command::Send {
            worker,
            refspec,
            full,
        } => operations::send::send(
            &system,
            &runner,
            resolver.as_ref(),
            &SendRequest {
                worker,
                refspec,
                force_full: full,
            },
        ),
        Command::Fetch { worker, refspec } => {
            operations::fetch::fetch(&system, &runner, &FetchRequest { worker, refspec })
        }
        Command::Apply {
            bundle_file,
            branch_spec,
            path,
            base_path,
        } => operations::apply::apply(
            &system,
            &runner,
            &ApplyRequest {
                bundle_file,
                branch_spec,
                explicit_path: path,
                base_path,
            },
        ),
        Command::Bundle {
            repo_name,
            branch,
            output,
            base_path,
        } => operations::bundle::bundle(
            &system,
            &runner,
            &BundleRequest {
                repo_name,
                branch,
                output,
                base_path,
            },
        ),
        Command::Register {
            worker,
            repo_name,
            path,
        } => operations::admin::register(&system, &worker, &repo_name, &path),
        Command::Remove { worker, repo_name } => {
            operations::admin::remove(&system, &worker, &repo_name)
        }
        Command::List { worker } => operations::admin::list(&system, worker.as_deref()),
    }
}
