//! # Error Handling
//!
//! This module defines the centralized error type for `pio-libbuild`. It uses
//! the `thiserror` library to create an `Error` enum covering every anticipated
//! failure mode of a publish, with enough context in each variant to tell
//! which step failed and against which remote, branch or path.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Git failures, registry failures, settings
//!   problems and filesystem errors each get their own variant.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the library.
//!
//! `Error::RemoteBranchNotFound` is special: it is produced by the clone helper
//! and consumed by the branch resolver, which falls back to creating an orphan
//! branch. It never reaches the caller of `Publisher::publish`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for pio-libbuild operations
#[derive(Error, Debug)]
pub enum Error {
    /// The requested branch does not exist on the remote.
    #[error("Remote branch {branch} not found in upstream origin")]
    RemoteBranchNotFound { branch: String },

    /// An error occurred while cloning a Git repository.
    ///
    /// Includes the repository URL, ref, error message, and an optional hint
    /// for resolution.
    #[error("Git clone error for {url}@{r#ref}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        r#ref: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// A Git command run inside a checkout failed.
    #[error("Git command failed in {}: {command} - {stderr}", dir.display())]
    GitCommand {
        command: String,
        dir: PathBuf,
        stderr: String,
    },

    /// The registry could not be reached or returned an unusable document.
    #[error("Registry error: {url} - {message}")]
    Registry { url: String, message: String },

    /// The stored example directory for a library does not exist.
    #[error("Examples for library {library_id} not found at {}", path.display())]
    ExamplesNotFound { library_id: u64, path: PathBuf },

    /// Library ids are positive integers.
    #[error("Invalid library id: {id}")]
    InvalidLibraryId { id: u64 },

    /// The version document returned by the registry has no usable `name`.
    #[error("Invalid library version: {message}")]
    InvalidVersion { message: String },

    /// Settings could not be loaded or are incomplete.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the settings
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
