//! Thin wrappers around the system `git` command.
//!
//! Every command runs with an explicit working directory, so the process's
//! own current directory is never touched. Using the system binary means
//! SSH keys, credential helpers and anything else configured in
//! `~/.gitconfig` are picked up automatically.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identity used for publish commits when the environment has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

/// Shallow-clone a single branch.
///
/// The result contains the last commit of `branch` only. Returns
/// [`Error::RemoteBranchNotFound`] when the remote has no such branch, so
/// callers can create it instead.
pub fn clone_shallow(url: &str, branch: &str, target_dir: &Path) -> Result<()> {
    // git won't clone into an existing non-empty dir
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    debug!("git clone --depth=1 --single-branch --branch {} {}", branch, url);
    let output = Command::new("git")
        .args(["clone", "--depth=1", "--single-branch", "--branch", branch, url])
        .arg(target_dir)
        .output()
        .map_err(|e| Error::GitClone {
            url: url.to_string(),
            r#ref: branch.to_string(),
            message: e.to_string(),
            hint: Some("is git installed and on PATH?".to_string()),
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if is_remote_branch_missing(&stderr, branch) {
        return Err(Error::RemoteBranchNotFound {
            branch: branch.to_string(),
        });
    }

    let hint = if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        Some(
            "make sure the SSH key or credential helper for the build repository is configured"
                .to_string(),
        )
    } else {
        None
    };

    Err(Error::GitClone {
        url: url.to_string(),
        r#ref: branch.to_string(),
        message: stderr.trim().to_string(),
        hint,
    })
}

/// Whether `git clone` stderr reports that `branch` does not exist upstream.
pub fn is_remote_branch_missing(stderr: &str, branch: &str) -> bool {
    let expected = format!("fatal: Remote branch {} not found in upstream origin", branch);
    stderr.lines().any(|line| line.trim() == expected)
}

/// Switch to a new, history-less branch with an empty index and working tree.
pub fn checkout_orphan(dir: &Path, branch: &str) -> Result<()> {
    run(dir, &["checkout", "--orphan", branch])?;
    // --orphan keeps the base branch's files staged; drop them
    run(dir, &["rm", "-r", "-f", "-q", "--ignore-unmatch", "."])?;
    Ok(())
}

/// Remove everything under `path` from the index, leaving the working tree alone.
pub fn unstage_tree(dir: &Path, path: &str) -> Result<()> {
    run(
        dir,
        &["rm", "-r", "-q", "--cached", "--ignore-unmatch", "--", path],
    )?;
    Ok(())
}

/// Stage the given repository-relative paths.
pub fn add(dir: &Path, paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }
    let mut args = vec!["add", "--"];
    args.extend(paths.iter().map(String::as_str));
    run(dir, &args)?;
    Ok(())
}

/// Commit the index. Empty commits are allowed so a forced publish always
/// produces a commit.
pub fn commit(dir: &Path, message: &str, author: Option<&CommitAuthor>) -> Result<()> {
    let mut args: Vec<String> = Vec::new();
    if let Some(author) = author {
        args.push("-c".to_string());
        args.push(format!("user.name={}", author.name));
        args.push("-c".to_string());
        args.push(format!("user.email={}", author.email));
    }
    args.extend(
        ["commit", "--allow-empty", "-q", "-m", message]
            .iter()
            .map(|s| s.to_string()),
    );
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run(dir, &args)?;
    Ok(())
}

/// Push `branch` to `origin`, setting it as the upstream.
pub fn push(dir: &Path, branch: &str) -> Result<()> {
    run(dir, &["push", "--set-upstream", "origin", branch])?;
    Ok(())
}

/// Run `git <args>` inside `dir`, mapping a non-zero exit to [`Error::GitCommand`].
fn run(dir: &Path, args: &[&str]) -> Result<Output> {
    let command = args.join(" ");
    debug!("git {} (in {})", command, dir.display());

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::GitCommand {
            command: command.clone(),
            dir: dir.to_path_buf(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command,
            dir: dir.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}
