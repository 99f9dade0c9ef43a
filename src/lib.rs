//! # Library Build Publisher
//!
//! This library publishes the example sketches of a library, together with a
//! generated Travis CI configuration, into a dedicated branch of a shared
//! "libbuild" repository. Every library gets its own orphan branch named
//! `library-<id>`, so each published version is built and tested in
//! isolation. It is designed to be used by the `pio-libbuild` command-line
//! tool but can be driven directly as well.
//!
//! ## Quick Example
//!
//! ```
//! use pio_libbuild::boards::BoardResolver;
//! use pio_libbuild::travis::TravisConfig;
//!
//! let boards = BoardResolver::default().resolve(&["atmelavr".to_string()]).boards;
//! let examples = vec!["examples/Blink.ino".to_string()];
//! let config = TravisConfig {
//!     library_id: 75,
//!     version_name: "1.0.3",
//!     boards: &boards,
//!     example_paths: &examples,
//! };
//!
//! let rendered = config.render();
//! assert!(rendered.contains("--board=uno --board=leonardo --board=megaatmega2560"));
//! assert!(rendered.contains("PLATFORMIO_CI_SRC=examples/Blink.ino"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Settings (`config`)**: remote of the build repository, registry URL and
//!   storage locations.
//! - **Registry (`registry`)**: fetches a library's current version and
//!   platforms.
//! - **Branch checkout (`repository`, `git`)**: shallow clones of a single
//!   branch, with orphan-branch creation when it does not exist yet.
//! - **Staging (`version`, `examples`, `boards`, `travis`)**: the version
//!   marker, the example sketches and the CI configuration written into the
//!   checkout.
//! - **Publisher (`publisher`)**: runs the whole flow and reports whether the
//!   branch was published, skipped because it was up to date, or failed.

pub mod boards;
pub mod config;
pub mod error;
pub mod examples;
pub mod git;
pub mod publisher;
pub mod registry;
pub mod repository;
pub mod travis;
pub mod version;
