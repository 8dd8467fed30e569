use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for repofleet
#[derive(Parser, Debug, Clone)]
#[command(name = "repofleet")]
#[command(about = "Synchronize git repositories between a coordinating machine and a fleet of workers")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Never prompt; fail fast on repo-name collisions
    #[arg(long, global = true)]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Initialize the registry store
    Init,

    /// Send a branch of the current repository to a worker
    Send {
        /// Worker name (or bare hostname for workers not in the directory)
        worker: String,

        /// Transfer descriptor: <local_branch>[:<repo_name>][@<remote_branch>]
        refspec: String,

        /// Ship the branch's full history even when an incremental bundle
        /// would do
        #[arg(long)]
        full: bool,
    },

    /// Fetch a branch of a worker's repository back into its registered path
    Fetch {
        /// Worker name (or bare hostname for workers not in the directory)
        worker: String,

        /// Transfer descriptor: <local_branch>[:<repo_name>][@<remote_branch>]
        refspec: String,
    },

    /// Apply a received bundle (runs on the receiving machine)
    Apply {
        /// Bundle file to apply; its stem names the repo
        bundle_file: PathBuf,

        /// Branch mapping: <bundle_branch>[:<local_branch>]
        branch_spec: String,

        /// Explicit target path, overriding <base-path>/<repo_name>
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Directory repos live under (default: ~/repos)
        #[arg(long, value_name = "DIR")]
        base_path: Option<String>,
    },

    /// Build a full bundle of a named repo's branch (runs on a worker)
    Bundle {
        /// Logical repo name under the base path
        repo_name: String,

        /// Branch to bundle
        branch: String,

        /// Where to write the bundle file
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Directory repos live under (default: ~/repos)
        #[arg(long, value_name = "DIR")]
        base_path: Option<String>,
    },

    /// Explicitly register a repo mapping for a worker
    Register {
        worker: String,
        repo_name: String,
        path: PathBuf,
    },

    /// Remove a repo mapping from a worker
    Remove { worker: String, repo_name: String },

    /// List registered repos, optionally for a single worker
    List { worker: Option<String> },
}
