//! Render command implementation
//!
//! Prints the `.travis.yml` a publish would write, using the stored examples
//! of the library (or an explicit directory) and the configured board sources.
//! Nothing is cloned, committed or pushed.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use pio_libbuild::boards::BoardResolver;
use pio_libbuild::config::Settings;
use pio_libbuild::examples;
use pio_libbuild::travis::TravisConfig;

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Library id in the registry
    #[arg(value_name = "ID")]
    pub library_id: u64,

    /// Version name used in the library install step
    #[arg(long, value_name = "NAME")]
    pub version_name: String,

    /// Platform of the library (repeatable)
    #[arg(long, value_name = "PLATFORM", required = true)]
    pub platform: Vec<String>,

    /// Directory with the example sketches (defaults to the stored examples)
    #[arg(long, value_name = "DIR")]
    pub examples: Option<PathBuf>,
}

/// Execute the render command
pub fn execute(args: RenderArgs, config: Option<&Path>) -> Result<()> {
    let settings = Settings::load(config).context("Failed to load settings")?;
    print!("{}", render(&args, &settings)?);
    Ok(())
}

fn render(args: &RenderArgs, settings: &Settings) -> Result<String> {
    let source = match &args.examples {
        Some(dir) => dir.clone(),
        None => examples::example_dir(settings.storage_dir()?, args.library_id)?,
    };
    let example_paths = examples::planned_paths(&source, args.library_id)?;

    let boards = BoardResolver::with_catalog(settings.boards_catalog.as_deref())
        .resolve(&args.platform)
        .boards;

    Ok(TravisConfig {
        library_id: args.library_id,
        version_name: &args.version_name,
        boards: &boards,
        example_paths: &example_paths,
    }
    .render())
}
