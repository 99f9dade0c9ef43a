//! # Settings
//!
//! This module defines the key-value settings consumed by the publisher and
//! the logic for loading them. Settings live in a single file which is parsed
//! with `serde_yaml`; since YAML is a superset of JSON, JSON settings files
//! load unchanged.
//!
//! ## Keys
//!
//! - `libbuild_repo_uri`: remote of the shared build repository (required).
//! - `registry_url`: base URL of the library registry.
//! - `dl_pio_dir`: root directory of the stored library files, where the
//!   example sketches of every library are kept.
//! - `base_branch`: branch cloned to seed new orphan branches.
//! - `boards_catalog`: optional JSON file mapping board names to their
//!   metadata, used as the dynamic board lookup.
//! - `work_dir`: where temporary checkouts are created (system temp dir by
//!   default).
//! - `commit_author`: `{name, email}` identity for publish commits, for hosts
//!   without a git identity configured.
//!
//! ## Environment Overrides
//!
//! `PIO_LIBBUILD_REPO_URI` and `PIO_LIBBUILD_REGISTRY_URL` take precedence over
//! the values found in the file.

use crate::error::{Error, Result};
use crate::git::CommitAuthor;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default registry base URL.
pub const DEFAULT_REGISTRY_URL: &str = "http://api.platformio.org";

/// Default branch used to seed orphan branches.
pub const DEFAULT_BASE_BRANCH: &str = "master";

/// Environment variable overriding `libbuild_repo_uri`.
pub const ENV_REPO_URI: &str = "PIO_LIBBUILD_REPO_URI";

/// Environment variable overriding `registry_url`.
pub const ENV_REGISTRY_URL: &str = "PIO_LIBBUILD_REGISTRY_URL";

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_base_branch() -> String {
    DEFAULT_BASE_BRANCH.to_string()
}

/// Publisher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Remote of the shared build repository (clone and push target).
    #[serde(default, alias = "LIBBUILD_REPO_URI")]
    pub libbuild_repo_uri: Option<String>,

    /// Base URL of the library registry.
    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    /// Root of the stored library files.
    #[serde(default, alias = "DL_PIO_DIR")]
    pub dl_pio_dir: Option<PathBuf>,

    /// Branch used to seed orphan branches.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// Optional board catalog used before the static board table.
    #[serde(default)]
    pub boards_catalog: Option<PathBuf>,

    /// Parent directory for temporary checkouts.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Identity for publish commits.
    #[serde(default)]
    pub commit_author: Option<CommitAuthor>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            libbuild_repo_uri: None,
            registry_url: default_registry_url(),
            dl_pio_dir: None,
            base_branch: default_base_branch(),
            boards_catalog: None,
            work_dir: None,
            commit_author: None,
        }
    }
}

impl Settings {
    /// Parse settings from a YAML or JSON string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| Error::Config {
            message: format!("invalid settings: {}", e),
            hint: Some("settings must be a YAML or JSON mapping".to_string()),
        })
    }

    /// Load settings from a file.
    ///
    /// Relative `dl_pio_dir`, `boards_catalog` and `work_dir` paths are resolved against
    /// the directory containing the settings file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            hint: Some("pass --config or set PIO_LIBBUILD_CONFIG".to_string()),
        })?;
        let mut settings = Self::parse(&content)?;

        if let Some(base) = path.parent() {
            settings.dl_pio_dir = settings.dl_pio_dir.map(|p| resolve_relative(base, p));
            settings.boards_catalog = settings
                .boards_catalog
                .map(|p| resolve_relative(base, p));
            settings.work_dir = settings.work_dir.map(|p| resolve_relative(base, p));
        }

        Ok(settings)
    }

    /// Load settings from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    /// Apply `PIO_LIBBUILD_*` environment overrides.
    pub fn apply_env(&mut self) {
        if let Some(uri) = non_empty_env(ENV_REPO_URI) {
            self.libbuild_repo_uri = Some(uri);
        }
        if let Some(url) = non_empty_env(ENV_REGISTRY_URL) {
            self.registry_url = url;
        }
    }

    /// The remote of the build repository, or a configuration error.
    pub fn repo_uri(&self) -> Result<&str> {
        self.libbuild_repo_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| Error::Config {
                message: "libbuild_repo_uri is not set".to_string(),
                hint: Some(format!(
                    "add 'libbuild_repo_uri' to the settings file or set {}",
                    ENV_REPO_URI
                )),
            })
    }

    /// The root of the stored library files, or a configuration error.
    pub fn storage_dir(&self) -> Result<&Path> {
        self.dl_pio_dir.as_deref().ok_or_else(|| Error::Config {
            message: "dl_pio_dir is not set".to_string(),
            hint: Some("add 'dl_pio_dir' to the settings file".to_string()),
        })
    }
}

fn resolve_relative(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
