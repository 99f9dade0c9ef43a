//! # Publish Command Implementation
//!
//! This module implements the `publish` subcommand, which updates the build
//! branch `library-<id>` of the libbuild repository.
//!
//! ## Functionality
//!
//! - **Registry lookup**: by default the library's current version and
//!   platforms are fetched from the registry.
//!
//! - **Explicit version**: with `--version-file` (a JSON version document) or
//!   `--version-name`, plus `--platform`, the registry is not contacted.
//!
//! - **Idempotency**: a branch that already holds the version is left alone
//!   unless `--force` is given.
//!
//! A failed publish is reported on stderr and exits with status 1; a skipped
//! publish exits with status 0.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

use pio_libbuild::config::Settings;
use pio_libbuild::publisher::{PublishRequest, PublishStatus, Publisher};
use pio_libbuild::registry::HttpRegistry;
use pio_libbuild::version::LibraryVersion;

/// Publish a library's examples and CI config into its build branch
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Library id in the registry
    #[arg(value_name = "ID")]
    pub library_id: u64,

    /// Publish even if the branch already holds this version
    #[arg(short, long)]
    pub force: bool,

    /// JSON file with the version document to publish, instead of asking the registry
    #[arg(long, value_name = "FILE", conflicts_with = "version_name", requires = "platform")]
    pub version_file: Option<PathBuf>,

    /// Version name to publish, instead of asking the registry
    #[arg(long, value_name = "NAME", requires = "platform")]
    pub version_name: Option<String>,

    /// Platform of the library (repeatable); used with --version-file or --version-name
    #[arg(long, value_name = "PLATFORM")]
    pub platform: Vec<String>,
}

/// Execute the `publish` command.
pub fn execute(args: PublishArgs, config: Option<&Path>) -> Result<()> {
    let settings = Settings::load(config).context("Failed to load settings")?;
    let publisher = Publisher::from_settings(&settings)?;

    let status = match explicit_version(&args)? {
        Some(version) => publisher.publish_best_effort(&PublishRequest {
            library_id: args.library_id,
            version,
            platforms: args.platform.clone(),
            force: args.force,
        }),
        None => {
            let registry = HttpRegistry::new(&settings.registry_url)?;
            publisher
                .publish_by_id(&registry, args.library_id, args.force)
                .with_context(|| {
                    format!("Failed to fetch library {} from the registry", args.library_id)
                })?
        }
    };

    match &status {
        PublishStatus::Failed { .. } => anyhow::bail!("{}", status),
        _ => println!("{}", status),
    }
    Ok(())
}

fn explicit_version(args: &PublishArgs) -> Result<Option<LibraryVersion>> {
    if let Some(path) = &args.version_file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read version file {}", path.display()))?;
        let value = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        return Ok(Some(LibraryVersion::new(value)?));
    }
    Ok(args.version_name.as_deref().map(LibraryVersion::named))
}
