//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

/// pio-libbuild - Publish library examples into per-library CI branches
#[derive(Parser, Debug)]
#[command(name = "pio-libbuild")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Path to the settings file (YAML or JSON)
    #[arg(long, global = true, value_name = "FILE", env = "PIO_LIBBUILD_CONFIG")]
    config: Option<PathBuf>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Publish a library's examples and CI config into its build branch
    Publish(commands::publish::PublishArgs),

    /// Print the CI config that would be published, without touching git
    Render(commands::render::RenderArgs),

    /// Show the boards the CI build would use for a set of platforms
    Boards(commands::boards::BoardsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // RUST_LOG, when set, wins over --log-level
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(&self.log_level),
        )
        .try_init();

        let config = self.config.as_deref();
        match self.command {
            Commands::Publish(args) => commands::publish::execute(args, config),
            Commands::Render(args) => commands::render::execute(args, config),
            Commands::Boards(args) => commands::boards::execute(args, config),
        }
    }
}
