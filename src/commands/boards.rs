//! Boards command implementation
//!
//! Shows which boards the CI build step would use for a set of platforms, and
//! which board source produced them.

use anyhow::{Context, Result};
use clap::Args;
use log::info;
use std::path::Path;

use pio_libbuild::boards::BoardResolver;
use pio_libbuild::config::Settings;

/// Arguments for the boards command
#[derive(Args, Debug)]
pub struct BoardsArgs {
    /// Platforms to resolve, in order
    #[arg(value_name = "PLATFORM", required = true)]
    pub platforms: Vec<String>,
}

/// Execute the boards command
pub fn execute(args: BoardsArgs, config: Option<&Path>) -> Result<()> {
    let settings = Settings::load(config).context("Failed to load settings")?;
    let resolved =
        BoardResolver::with_catalog(settings.boards_catalog.as_deref()).resolve(&args.platforms);

    match &resolved.source {
        Some(source) => info!("Boards resolved from the {} source", source),
        None => anyhow::bail!("No boards known for platforms: {}", args.platforms.join(", ")),
    }
    for board in &resolved.boards {
        println!("{}", board);
    }
    Ok(())
}
