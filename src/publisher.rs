//! # Publisher
//!
//! This module ties the other pieces together into one publish:
//!
//! 1.  **Checkout**: shallow-clone `library-<id>` from the build repository
//!     into a fresh temporary directory, creating it as an orphan branch when
//!     the remote does not have it yet.
//! 2.  **Idempotency gate**: if the staged `_version.json` already equals the
//!     requested version, stop here (unless forced).
//! 3.  **Staging**: write the version marker, replace `examples/` with the
//!     library's stored example sketches, render `.travis.yml`.
//! 4.  **Commit and push**: one commit per publish, pushed with upstream
//!     tracking.
//!
//! The temporary checkout is owned by a `tempfile::TempDir` and removed when
//! the publish returns, whatever the outcome. The process working directory is
//! never changed: every step receives the checkout path explicitly.
//!
//! [`Publisher::publish`] reports failures as `Err`. [`Publisher::publish_best_effort`]
//! is the boundary that never fails: errors are logged and turned into
//! [`PublishStatus::Failed`].

use crate::boards::BoardResolver;
use crate::config::Settings;
use crate::error::Result;
use crate::examples::{self, EXAMPLES_DIR};
use crate::git::CommitAuthor;
use crate::registry::Registry;
use crate::repository::{branch_name, resolve_branch, DefaultGitOperations, GitOperations};
use crate::travis::{TravisConfig, TRAVIS_FILENAME};
use crate::version::{self, LibraryVersion, StagedCheck, VERSION_FILENAME};
use log::{error, info, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Subdirectory of the temporary directory that holds the clone.
const CHECKOUT_DIR: &str = "checkout";

/// Commit message for a publish.
pub fn commit_message(version: &LibraryVersion) -> String {
    format!("Update library to version {}", version.name())
}

/// What to publish.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub library_id: u64,
    pub version: LibraryVersion,
    pub platforms: Vec<String>,
    /// Publish even when the branch already holds this version.
    pub force: bool,
}

/// Details of a publish that produced a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub branch: String,
    pub version: String,
    /// The branch did not exist upstream and was created.
    pub created_branch: bool,
    /// Staged example paths, relative to the branch root.
    pub examples: Vec<String>,
    pub boards: Vec<String>,
}

/// Result of a publish that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published(PublishReport),
    /// The branch already holds the requested version.
    Skipped { branch: String, version: String },
}

/// Result of a best-effort publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    Published(PublishReport),
    Skipped { branch: String, version: String },
    Failed { branch: String, reason: String },
}

impl PublishStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl From<PublishOutcome> for PublishStatus {
    fn from(outcome: PublishOutcome) -> Self {
        match outcome {
            PublishOutcome::Published(report) => Self::Published(report),
            PublishOutcome::Skipped { branch, version } => Self::Skipped { branch, version },
        }
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published(report) => write!(
                f,
                "published version {} to {}{} ({} example(s), {} board(s))",
                report.version,
                report.branch,
                if report.created_branch { " (new branch)" } else { "" },
                report.examples.len(),
                report.boards.len()
            ),
            Self::Skipped { branch, version } => {
                write!(f, "{} already holds version {}, nothing to do", branch, version)
            }
            Self::Failed { branch, reason } => write!(f, "publishing {} failed: {}", branch, reason),
        }
    }
}

/// Publishes library examples into per-library branches of the build repository.
pub struct Publisher {
    git_ops: Box<dyn GitOperations>,
    boards: BoardResolver,
    repo_uri: String,
    base_branch: String,
    storage_root: PathBuf,
    work_dir: Option<PathBuf>,
    author: Option<CommitAuthor>,
}

impl Publisher {
    /// A publisher using the system `git` and the board sources named in
    /// `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            git_ops: Box::new(DefaultGitOperations),
            boards: BoardResolver::with_catalog(settings.boards_catalog.as_deref()),
            repo_uri: settings.repo_uri()?.to_string(),
            base_branch: settings.base_branch.clone(),
            storage_root: settings.storage_dir()?.to_path_buf(),
            work_dir: settings.work_dir.clone(),
            author: settings.commit_author.clone(),
        })
    }

    /// Replace the git implementation.
    pub fn with_git_operations(mut self, git_ops: Box<dyn GitOperations>) -> Self {
        self.git_ops = git_ops;
        self
    }

    /// Replace the board lookup.
    pub fn with_board_resolver(mut self, boards: BoardResolver) -> Self {
        self.boards = boards;
        self
    }

    fn temp_checkout(&self, library_id: u64) -> Result<TempDir> {
        let prefix = format!("pio-libbuild-{}-", library_id);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let dir = match &self.work_dir {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// Publish `request` into its build branch.
    pub fn publish(&self, request: &PublishRequest) -> Result<PublishOutcome> {
        let branch = branch_name(request.library_id);
        let example_source = examples::example_dir(&self.storage_root, request.library_id)?;

        let temp = self.temp_checkout(request.library_id)?;
        let checkout_dir = temp.path().join(CHECKOUT_DIR);

        let checkout = resolve_branch(
            self.git_ops.as_ref(),
            &self.repo_uri,
            &branch,
            &self.base_branch,
            &checkout_dir,
        )?;

        if version::check_staged(&checkout_dir, &request.version, request.force)? == StagedCheck::Skip {
            info!(
                "Staged version of {} is equal to {}. Update not required.",
                branch, request.version
            );
            return Ok(PublishOutcome::Skipped {
                branch,
                version: request.version.name(),
            });
        }

        version::write_marker(&checkout_dir, &request.version)?;
        let example_paths =
            examples::stage_examples(&checkout_dir, &example_source, request.library_id)?;

        let resolved = self.boards.resolve(&request.platforms);
        if resolved.boards.is_empty() {
            warn!(
                "No boards known for platforms {:?} of library {}",
                request.platforms, request.library_id
            );
        }
        let version_name = request.version.name();
        let travis = TravisConfig {
            library_id: request.library_id,
            version_name: &version_name,
            boards: &resolved.boards,
            example_paths: &example_paths,
        }
        .render();
        fs::write(checkout_dir.join(TRAVIS_FILENAME), travis)?;

        self.commit_and_push(&checkout_dir, &checkout.branch, &request.version, &example_paths)?;

        info!("Published {} version {}", checkout.branch, version_name);
        Ok(PublishOutcome::Published(PublishReport {
            branch: checkout.branch,
            version: version_name,
            created_branch: checkout.created,
            examples: example_paths,
            boards: resolved.boards,
        }))
    }

    fn commit_and_push(
        &self,
        dir: &Path,
        branch: &str,
        version: &LibraryVersion,
        example_paths: &[String],
    ) -> Result<()> {
        // stale examples must leave the index as well as the working tree
        self.git_ops.unstage_tree(dir, EXAMPLES_DIR)?;

        let mut paths = vec![VERSION_FILENAME.to_string(), TRAVIS_FILENAME.to_string()];
        paths.extend(example_paths.iter().cloned());
        self.git_ops.add(dir, &paths)?;
        self.git_ops
            .commit(dir, &commit_message(version), self.author.as_ref())?;
        self.git_ops.push(dir, branch)
    }

    /// Publish without ever failing: errors are logged and reported as
    /// [`PublishStatus::Failed`].
    pub fn publish_best_effort(&self, request: &PublishRequest) -> PublishStatus {
        match self.publish(request) {
            Ok(outcome) => outcome.into(),
            Err(e) => {
                let branch = branch_name(request.library_id);
                error!("Publishing {} failed: {:?}", branch, e);
                PublishStatus::Failed {
                    branch,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Fetch version and platforms from `registry`, then publish best-effort.
    ///
    /// Registry failures are returned as `Err`; everything after that follows
    /// [`Publisher::publish_best_effort`].
    pub fn publish_by_id(
        &self,
        registry: &dyn Registry,
        library_id: u64,
        force: bool,
    ) -> Result<PublishStatus> {
        let info = registry.library_info(library_id)?;
        Ok(self.publish_best_effort(&PublishRequest {
            library_id,
            version: info.version,
            platforms: info.platforms,
            force,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::registry::LibraryInfo;
    use crate::repository::tests::{GitCall, MockGitOperations};
    use serde_json::json;
    use std::env;

    struct Fixture {
        storage: TempDir,
        work: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                storage: TempDir::new().unwrap(),
                work: TempDir::new().unwrap(),
            }
        }

        fn with_examples(self, library_id: u64, files: &[&str]) -> Self {
            let dir = examples::example_dir(self.storage.path(), library_id).unwrap();
            fs::create_dir_all(&dir).unwrap();
            for name in files {
                fs::write(dir.join(name), format!("// {}", name)).unwrap();
            }
            self
        }

        fn settings(&self) -> Settings {
            Settings {
                libbuild_repo_uri: Some("/remote/libbuild.git".to_string()),
                dl_pio_dir: Some(self.storage.path().to_path_buf()),
                work_dir: Some(self.work.path().to_path_buf()),
                ..Settings::default()
            }
        }

        fn publisher(&self, git: &MockGitOperations) -> Publisher {
            Publisher::from_settings(&self.settings())
                .unwrap()
                .with_git_operations(Box::new(git.clone()))
        }

        fn work_dir_is_empty(&self) -> bool {
            fs::read_dir(self.work.path()).unwrap().next().is_none()
        }
    }

    fn request(library_id: u64, name: &str, force: bool) -> PublishRequest {
        PublishRequest {
            library_id,
            version: LibraryVersion::named(name),
            platforms: vec!["atmelavr".to_string()],
            force,
        }
    }

    fn marker(name: &str) -> String {
        serde_json::to_string_pretty(&json!({ "name": name })).unwrap()
    }

    fn committed(calls: &[GitCall]) -> bool {
        calls.iter().any(|c| matches!(c, GitCall::Commit { .. }))
    }

    fn pushed(calls: &[GitCall]) -> bool {
        calls.iter().any(|c| matches!(c, GitCall::Push { .. }))
    }

    #[test]
    fn test_commit_message() {
        assert_eq!(
            commit_message(&LibraryVersion::named("1.0.3")),
            "Update library to version 1.0.3"
        );
    }

    #[test]
    fn test_from_settings_requires_repo_uri() {
        let settings = Settings {
            dl_pio_dir: Some(PathBuf::from("/srv")),
            ..Settings::default()
        };
        assert!(matches!(
            Publisher::from_settings(&settings),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_publish_existing_branch() {
        let fixture = Fixture::new().with_examples(1, &["Blink.ino"]);
        let git = MockGitOperations::new().with_branch("library-1", &[("_version.json", marker("0.9").as_str())]);

        let outcome = fixture.publisher(&git).publish(&request(1, "1.0", false)).unwrap();

        let report = match outcome {
            PublishOutcome::Published(report) => report,
            other => panic!("expected a publish, got {other:?}"),
        };
        assert_eq!(report.branch, "library-1");
        assert_eq!(report.version, "1.0");
        assert!(!report.created_branch);
        assert_eq!(report.examples, vec!["examples/Blink.ino"]);
        assert_eq!(report.boards, vec!["uno", "leonardo", "megaatmega2560"]);
        assert_eq!(
            git.calls(),
            vec![
                GitCall::Clone {
                    url: "/remote/libbuild.git".to_string(),
                    branch: "library-1".to_string()
                },
                GitCall::Unstage {
                    path: "examples".to_string()
                },
                GitCall::Add {
                    paths: vec![
                        "_version.json".to_string(),
                        ".travis.yml".to_string(),
                        "examples/Blink.ino".to_string()
                    ]
                },
                GitCall::Commit {
                    message: "Update library to version 1.0".to_string()
                },
                GitCall::Push {
                    branch: "library-1".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_publish_same_version_is_skipped() {
        let fixture = Fixture::new().with_examples(2, &["Blink.ino"]);
        let git = MockGitOperations::new().with_branch("library-2", &[("_version.json", marker("1.0").as_str())]);

        let outcome = fixture.publisher(&git).publish(&request(2, "1.0", false)).unwrap();

        assert_eq!(
            outcome,
            PublishOutcome::Skipped {
                branch: "library-2".to_string(),
                version: "1.0".to_string()
            }
        );
        let calls = git.calls();
        assert_eq!(calls.len(), 1);
        assert!(!committed(&calls));
        assert!(!pushed(&calls));
    }

    #[test]
    fn test_publish_same_version_forced() {
        let fixture = Fixture::new().with_examples(3, &["Blink.ino"]);
        let git = MockGitOperations::new().with_branch("library-3", &[("_version.json", marker("1.0").as_str())]);

        let outcome = fixture.publisher(&git).publish(&request(3, "1.0", true)).unwrap();

        assert!(matches!(outcome, PublishOutcome::Published(_)));
        let calls = git.calls();
        assert!(committed(&calls));
        assert!(pushed(&calls));
    }

    #[test]
    fn test_publish_missing_branch_creates_it() {
        let fixture = Fixture::new().with_examples(4, &["a.ino", "b.ino"]);
        let git = MockGitOperations::new().with_branch("master", &[("README.md", "# libbuild")]);

        let outcome = fixture.publisher(&git).publish(&request(4, "2.1", false)).unwrap();

        let report = match outcome {
            PublishOutcome::Published(report) => report,
            other => panic!("expected a publish, got {other:?}"),
        };
        assert!(report.created_branch);
        let calls = git.calls();
        assert!(calls.contains(&GitCall::Orphan {
            branch: "library-4".to_string()
        }));
        assert!(calls.contains(&GitCall::Push {
            branch: "library-4".to_string()
        }));
    }

    #[test]
    fn test_publish_replaces_stale_examples() {
        let fixture = Fixture::new().with_examples(5, &["new.ino"]);
        let git = MockGitOperations::new().with_branch(
            "library-5",
            &[("_version.json", marker("1.0").as_str()), ("examples/old.ino", "old")],
        );

        fixture.publisher(&git).publish(&request(5, "1.1", false)).unwrap();

        let added: Vec<String> = git
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                GitCall::Add { paths } => Some(paths),
                _ => None,
            })
            .flatten()
            .collect();
        assert!(added.contains(&"examples/new.ino".to_string()));
        assert!(!added.contains(&"examples/old.ino".to_string()));
    }

    #[test]
    fn test_publish_cleans_up_on_success() {
        let fixture = Fixture::new().with_examples(6, &["Blink.ino"]);
        let git = MockGitOperations::new().with_branch("library-6", &[]);
        let cwd = env::current_dir().unwrap();

        fixture.publisher(&git).publish(&request(6, "1.0", false)).unwrap();

        assert!(fixture.work_dir_is_empty());
        assert_eq!(env::current_dir().unwrap(), cwd);
        let cloned_into = git.clone_dirs.lock().unwrap().clone();
        assert!(cloned_into.iter().all(|dir| !dir.exists()));
    }

    #[test]
    fn test_publish_cleans_up_on_failure() {
        // no stored examples for library 7
        let fixture = Fixture::new();
        let git = MockGitOperations::new().with_branch("library-7", &[]);
        let cwd = env::current_dir().unwrap();

        let err = fixture.publisher(&git).publish(&request(7, "1.0", false)).unwrap_err();

        assert!(matches!(err, Error::ExamplesNotFound { library_id: 7, .. }));
        assert!(fixture.work_dir_is_empty());
        assert_eq!(env::current_dir().unwrap(), cwd);
        assert!(!pushed(&git.calls()));
    }

    #[test]
    fn test_publish_rejects_library_id_zero() {
        let fixture = Fixture::new();
        let git = MockGitOperations::new();

        let err = fixture.publisher(&git).publish(&request(0, "1.0", false)).unwrap_err();

        assert!(matches!(err, Error::InvalidLibraryId { id: 0 }));
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_best_effort_reports_push_failure() {
        let fixture = Fixture::new().with_examples(8, &["Blink.ino"]);
        let mut git = MockGitOperations::new().with_branch("library-8", &[]);
        git.push_error = Some("! [rejected] library-8 -> library-8 (fetch first)".to_string());

        let status = fixture
            .publisher(&git)
            .publish_best_effort(&request(8, "1.0", false));

        match &status {
            PublishStatus::Failed { branch, reason } => {
                assert_eq!(branch, "library-8");
                assert!(reason.contains("rejected"));
            }
            other => panic!("expected a failure, got {other:?}"),
        }
        assert!(status.is_failed());
        assert!(fixture.work_dir_is_empty());
    }

    #[test]
    fn test_best_effort_passes_through_skip() {
        let fixture = Fixture::new().with_examples(9, &[]);
        let git = MockGitOperations::new().with_branch("library-9", &[("_version.json", marker("3").as_str())]);

        let status = fixture
            .publisher(&git)
            .publish_best_effort(&request(9, "3", false));

        assert_eq!(
            status,
            PublishStatus::Skipped {
                branch: "library-9".to_string(),
                version: "3".to_string()
            }
        );
        assert!(status.to_string().contains("nothing to do"));
    }

    #[test]
    fn test_publish_uses_configured_board_resolver() {
        use crate::boards::{BoardCatalog, StaticBoardTable};

        let fixture = Fixture::new().with_examples(12, &["Blink.ino"]);
        let git = MockGitOperations::new().with_branch("library-12", &[]);
        let catalog = BoardCatalog::parse(r#"{"pro8MHzatmega328": {"platform": "atmelavr"}}"#).unwrap();
        let resolver = BoardResolver::new(vec![Box::new(catalog), Box::new(StaticBoardTable)]);

        let outcome = fixture
            .publisher(&git)
            .with_board_resolver(resolver)
            .publish(&request(12, "1.0", false))
            .unwrap();

        let report = match outcome {
            PublishOutcome::Published(report) => report,
            other => panic!("expected a publish, got {other:?}"),
        };
        assert_eq!(report.boards, vec!["pro8MHzatmega328"]);
    }

    struct FakeRegistry(Option<LibraryInfo>);

    impl Registry for FakeRegistry {
        fn library_info(&self, library_id: u64) -> Result<LibraryInfo> {
            self.0.clone().ok_or_else(|| Error::Registry {
                url: format!("http://registry/lib/info/{}", library_id),
                message: "HTTP status 404 Not Found".to_string(),
            })
        }
    }

    #[test]
    fn test_publish_by_id_uses_registry_metadata() {
        let fixture = Fixture::new().with_examples(10, &["Blink.ino"]);
        let git = MockGitOperations::new().with_branch("library-10", &[]);
        let registry = FakeRegistry(Some(LibraryInfo {
            version: LibraryVersion::new(json!({"name": "4.2", "released": "2015"})).unwrap(),
            platforms: vec!["teensy".to_string()],
        }));

        let status = fixture
            .publisher(&git)
            .publish_by_id(&registry, 10, false)
            .unwrap();

        let report = match status {
            PublishStatus::Published(report) => report,
            other => panic!("expected a publish, got {other:?}"),
        };
        assert_eq!(report.version, "4.2");
        assert_eq!(report.boards, vec!["teensy20", "teensy31"]);
    }

    #[test]
    fn test_publish_by_id_propagates_registry_failure() {
        let fixture = Fixture::new();
        let git = MockGitOperations::new();

        let err = fixture
            .publisher(&git)
            .publish_by_id(&FakeRegistry(None), 11, false)
            .unwrap_err();

        assert!(matches!(err, Error::Registry { .. }));
        assert!(git.calls().is_empty());
    }
}
