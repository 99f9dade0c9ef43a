//! # CLI Command Implementations
//!
//! Each subcommand of the `pio-libbuild` tool lives in its own file and
//! contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the optional
//!   settings file path, and calls into the `pio_libbuild` library.

pub mod boards;
pub mod publish;
pub mod render;
