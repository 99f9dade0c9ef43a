//! Shared test utilities for integration and E2E tests.
//!
//! [`LibbuildFixture`] sets up everything a publish needs on the local
//! machine: a bare "remote" build repository seeded with a `master` branch,
//! a storage root for stored examples, a work dir for temporary checkouts and
//! a settings file pointing at all of them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = LibbuildFixture::new().with_examples(75, &["Blink.ino"]);
//! let publisher = Publisher::from_settings(&fixture.settings()).unwrap();
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use pio_libbuild::config::Settings;
use pio_libbuild::examples;
use pio_libbuild::git::CommitAuthor;

/// Re-export commonly used test dependencies for convenience.
#[allow(unused_imports)]
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    pub use super::LibbuildFixture;
}

/// Run `git <args>` in `dir` and return stdout; panics on failure.
#[allow(dead_code)]
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A local build repository, storage root and settings file.
pub struct LibbuildFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl LibbuildFixture {
    /// Create the bare remote with a `master` branch holding a README.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::create_dir_all(root.join("storage")).unwrap();
        fs::create_dir_all(root.join("work")).unwrap();
        git(root, &["init", "-q", "--bare", "remote.git"]);

        let seed = root.join("seed");
        fs::create_dir_all(&seed).unwrap();
        git(&seed, &["init", "-q"]);
        git(&seed, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        fs::write(seed.join("README.md"), "# libbuild\n").unwrap();
        git(&seed, &["add", "README.md"]);
        git(&seed, &["commit", "-q", "-m", "Initial commit"]);
        let remote = root.join("remote.git");
        git(&seed, &["push", "-q", remote.to_str().unwrap(), "master"]);

        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn remote_path(&self) -> PathBuf {
        self.path().join("remote.git")
    }

    /// `file://` URL of the remote, so clones are really shallow.
    pub fn remote_url(&self) -> String {
        format!("file://{}", self.remote_path().display())
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.path().join("storage")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.path().join("work")
    }

    pub fn example_dir(&self, library_id: u64) -> PathBuf {
        examples::example_dir(&self.storage_dir(), library_id).unwrap()
    }

    /// Store example sketches for a library.
    pub fn with_examples(self, library_id: u64, names: &[&str]) -> Self {
        let dir = self.example_dir(library_id);
        fs::create_dir_all(&dir).unwrap();
        for name in names {
            fs::write(dir.join(name), format!("// {}\nvoid setup() {{}}\n", name)).unwrap();
        }
        self
    }

    /// Replace the stored examples of a library.
    pub fn replace_examples(&self, library_id: u64, names: &[&str]) {
        let dir = self.example_dir(library_id);
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        for name in names {
            fs::write(dir.join(name), format!("// {}\n", name)).unwrap();
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            libbuild_repo_uri: Some(self.remote_url()),
            dl_pio_dir: Some(self.storage_dir()),
            work_dir: Some(self.work_dir()),
            commit_author: Some(CommitAuthor {
                name: "libbuild bot".to_string(),
                email: "libbuild@example.com".to_string(),
            }),
            ..Settings::default()
        }
    }

    /// Write the settings to `settings.yaml` and return its path.
    pub fn settings_file(&self) -> PathBuf {
        let path = self.path().join("settings.yaml");
        fs::write(&path, serde_yaml::to_string(&self.settings()).unwrap()).unwrap();
        path
    }

    /// Files tracked on `branch` of the remote, sorted.
    pub fn branch_files(&self, branch: &str) -> Vec<String> {
        let mut files: Vec<String> = git(
            &self.remote_path(),
            &["ls-tree", "-r", "--name-only", branch],
        )
        .lines()
        .map(str::to_string)
        .collect();
        files.sort();
        files
    }

    /// Number of commits reachable from `branch` on the remote.
    pub fn commit_count(&self, branch: &str) -> usize {
        git(&self.remote_path(), &["rev-list", "--count", branch])
            .trim()
            .parse()
            .unwrap()
    }

    /// Content of `path` on `branch` of the remote.
    pub fn show(&self, branch: &str, path: &str) -> String {
        git(&self.remote_path(), &["show", &format!("{}:{}", branch, path)])
    }

    /// Subject of the last commit on `branch`.
    pub fn last_subject(&self, branch: &str) -> String {
        git(&self.remote_path(), &["log", "-1", "--format=%s", branch])
            .trim()
            .to_string()
    }

    pub fn work_dir_is_empty(&self) -> bool {
        fs::read_dir(self.work_dir()).unwrap().next().is_none()
    }
}

impl Default for LibbuildFixture {
    fn default() -> Self {
        Self::new()
    }
}
