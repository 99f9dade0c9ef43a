//! # Branch Checkout Management
//!
//! This module provides the `GitOperations` trait, the seam between the
//! publisher and the version-control system, and `resolve_branch`, which turns
//! a branch name into a working checkout whether or not the branch exists
//! upstream yet.
//!
//! ## Design
//!
//! In the main application `DefaultGitOperations` wraps the system `git`
//! command (see [`crate::git`]). In tests it is replaced with mock
//! implementations that record calls, so the publish flow can be exercised
//! without a remote.

use crate::error::{Error, Result};
use crate::git::CommitAuthor;
use log::{debug, info};
use std::path::Path;

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Shallow-clones a single branch into `target_dir`.
    ///
    /// Must return [`Error::RemoteBranchNotFound`] when the branch does not
    /// exist upstream.
    fn clone_shallow(&self, url: &str, branch: &str, target_dir: &Path) -> Result<()>;

    /// Creates `branch` as an orphan in the checkout, with nothing staged.
    fn checkout_orphan(&self, dir: &Path, branch: &str) -> Result<()>;

    /// Drops every index entry under `path`.
    fn unstage_tree(&self, dir: &Path, path: &str) -> Result<()>;

    /// Stages repository-relative paths.
    fn add(&self, dir: &Path, paths: &[String]) -> Result<()>;

    /// Commits the index with `message`.
    fn commit(&self, dir: &Path, message: &str, author: Option<&CommitAuthor>) -> Result<()>;

    /// Pushes `branch` to `origin` and sets the upstream.
    fn push(&self, dir: &Path, branch: &str) -> Result<()>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_shallow(&self, url: &str, branch: &str, target_dir: &Path) -> Result<()> {
        crate::git::clone_shallow(url, branch, target_dir)
    }

    fn checkout_orphan(&self, dir: &Path, branch: &str) -> Result<()> {
        crate::git::checkout_orphan(dir, branch)
    }

    fn unstage_tree(&self, dir: &Path, path: &str) -> Result<()> {
        crate::git::unstage_tree(dir, path)
    }

    fn add(&self, dir: &Path, paths: &[String]) -> Result<()> {
        crate::git::add(dir, paths)
    }

    fn commit(&self, dir: &Path, message: &str, author: Option<&CommitAuthor>) -> Result<()> {
        crate::git::commit(dir, message, author)
    }

    fn push(&self, dir: &Path, branch: &str) -> Result<()> {
        crate::git::push(dir, branch)
    }
}

/// A checkout produced by [`resolve_branch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchCheckout {
    /// Branch checked out in the working tree.
    pub branch: String,
    /// Whether the branch was missing upstream and created locally.
    pub created: bool,
}

/// Name of the build branch for a library.
pub fn branch_name(library_id: u64) -> String {
    format!("library-{}", library_id)
}

/// Clones `branch` from `url` into `target_dir`.
///
/// If the remote has no such branch, `base_branch` is cloned instead and
/// `branch` is created locally as an orphan. Any other clone failure
/// propagates.
pub fn resolve_branch(
    git_ops: &dyn GitOperations,
    url: &str,
    branch: &str,
    base_branch: &str,
    target_dir: &Path,
) -> Result<BranchCheckout> {
    debug!("Cloning branch {}", branch);
    match git_ops.clone_shallow(url, branch, target_dir) {
        Ok(()) => {
            info!("Cloned {} into {}", branch, target_dir.display());
            Ok(BranchCheckout {
                branch: branch.to_string(),
                created: false,
            })
        }
        Err(Error::RemoteBranchNotFound { .. }) => {
            debug!("Branch {} not found, creating it from {}", branch, base_branch);
            git_ops.clone_shallow(url, base_branch, target_dir)?;
            git_ops.checkout_orphan(target_dir, branch)?;
            info!(
                "Created orphan branch {} in {}",
                branch,
                target_dir.display()
            );
            Ok(BranchCheckout {
                branch: branch.to_string(),
                created: true,
            })
        }
        Err(e) => Err(e),
    }
}
