//! Refspec parsing
//!
//! A refspec is the compact transfer descriptor accepted by `send` and
//! `fetch`: `<local_branch>[:<repo_name>][@<remote_branch>]`.

/// Parsed transfer descriptor
///
/// `explicit_name` records whether the repo name was spelled out or filled
/// in from the caller's default; the registry's collision handling treats
/// the two differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refspec {
    pub local_branch: String,
    pub repo_name: String,
    pub remote_branch: String,
    pub explicit_name: bool,
}

impl Refspec {
    /// Parse a refspec string against a caller-supplied default repo name
    /// (conventionally the local directory's base name).
    ///
    /// Splits on `@` first: everything after it is the remote branch, which
    /// otherwise defaults to the local branch. The remainder splits on `:`
    /// into local branch and repo name; without a `:` the repo name is the
    /// default and `explicit_name` is false.
    ///
    /// There are no error conditions; malformed or empty input yields empty
    /// fields and validation is the caller's responsibility.
    #[must_use]
    pub fn parse(input: &str, default_name: &str) -> Self {
        let (head, remote) = match input.split_once('@') {
            Some((head, remote)) => (head, Some(remote)),
            None => (input, None),
        };

        let (local_branch, repo_name, explicit_name) = match head.split_once(':') {
            Some((branch, name)) => (branch.to_owned(), name.to_owned(), true),
            None => (head.to_owned(), default_name.to_owned(), false),
        };

        let remote_branch = match remote {
            Some(branch) => branch.to_owned(),
            None => local_branch.clone(),
        };

        return Self {
            local_branch,
            repo_name,
            remote_branch,
            explicit_name,
        };
    }
}
