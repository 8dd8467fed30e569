//! Bundle building and application
//!
//! A bundle is a self-contained file serializing one branch plus the
//! commits needed to reconstitute it. Sends ship incremental bundles when
//! the transfer state allows it; the receiving side either clones a new
//! repository out of the bundle or fast-forwards an existing branch.

pub mod apply;
pub mod build;

pub use apply::{ApplyOutcome, BranchSpec, MISSING_REPO_MARKER, apply_bundle, resolve_target};
pub use build::{BundlePlan, create_bundle_file, plan_bundle};
