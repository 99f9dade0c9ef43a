//! # Board Resolution
//!
//! The CI build step needs a list of boards to compile every example for.
//! Boards are derived from the library's platforms by an ordered list of
//! [`BoardSource`] strategies:
//!
//! 1. [`BoardCatalog`]: a board catalog (board name -> metadata including its
//!    `platform`), filtered by platform membership. Used when configured.
//! 2. [`StaticBoardTable`]: a small fixed table of representative boards per
//!    platform.
//!
//! The first source that yields a non-empty list wins. A source that fails
//! is logged and skipped, so a broken catalog degrades to the static table.

use crate::error::Result;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Static platform -> boards table, in build order.
pub const STATIC_BOARDS: &[(&str, &[&str])] = &[
    ("atmelavr", &["uno", "leonardo", "megaatmega2560"]),
    ("teensy", &["teensy20", "teensy31"]),
];

/// A strategy mapping platforms to boards.
pub trait BoardSource {
    /// Short name used in logs and CLI output.
    fn name(&self) -> &str;

    /// Boards for the given platforms. An empty list means "no answer".
    fn boards_for(&self, platforms: &[String]) -> Result<Vec<String>>;
}

/// The fixed fallback table.
pub struct StaticBoardTable;

impl BoardSource for StaticBoardTable {
    fn name(&self) -> &str {
        "static"
    }

    fn boards_for(&self, platforms: &[String]) -> Result<Vec<String>> {
        let mut boards = Vec::new();
        for platform in platforms {
            if let Some((_, names)) = STATIC_BOARDS.iter().find(|(p, _)| p == platform) {
                for name in names.iter() {
                    if !boards.iter().any(|b| b == name) {
                        boards.push(name.to_string());
                    }
                }
            }
        }
        Ok(boards)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct BoardInfo {
    #[serde(default)]
    platform: Option<String>,
}

/// A board catalog keyed by board name.
///
/// The JSON shape is `{"<board>": {"platform": "<platform>", ...}, ...}`;
/// other per-board fields are ignored. Boards are returned in name order.
#[derive(Debug, Clone, Default)]
pub struct BoardCatalog {
    boards: BTreeMap<String, BoardInfo>,
}

impl BoardCatalog {
    /// Parse a catalog from JSON.
    pub fn parse(content: &str) -> Result<Self> {
        let boards = serde_json::from_str(content)?;
        Ok(Self { boards })
    }

    /// Load a catalog from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

impl BoardSource for BoardCatalog {
    fn name(&self) -> &str {
        "catalog"
    }

    fn boards_for(&self, platforms: &[String]) -> Result<Vec<String>> {
        Ok(self
            .boards
            .iter()
            .filter(|(_, info)| {
                info.platform
                    .as_ref()
                    .is_some_and(|p| platforms.iter().any(|wanted| wanted == p))
            })
            .map(|(name, _)| name.clone())
            .collect())
    }
}

/// A catalog file, read and parsed on every lookup.
///
/// Keeps a missing or malformed catalog file from failing anything but its
/// own lookup.
pub struct CatalogFile {
    path: std::path::PathBuf,
}

impl CatalogFile {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BoardSource for CatalogFile {
    fn name(&self) -> &str {
        "catalog"
    }

    fn boards_for(&self, platforms: &[String]) -> Result<Vec<String>> {
        BoardCatalog::from_file(&self.path)?.boards_for(platforms)
    }
}

/// Boards chosen for a platform set and the source that chose them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBoards {
    pub boards: Vec<String>,
    /// Name of the winning source, `None` when no source had an answer.
    pub source: Option<String>,
}

/// Ordered board lookup strategies.
pub struct BoardResolver {
    sources: Vec<Box<dyn BoardSource>>,
}

impl BoardResolver {
    /// A resolver trying `sources` in order.
    pub fn new(sources: Vec<Box<dyn BoardSource>>) -> Self {
        Self { sources }
    }

    /// Catalog file first (when given), then the static table.
    pub fn with_catalog(catalog: Option<&Path>) -> Self {
        let mut sources: Vec<Box<dyn BoardSource>> = Vec::new();
        if let Some(path) = catalog {
            sources.push(Box::new(CatalogFile::new(path)));
        }
        sources.push(Box::new(StaticBoardTable));
        Self::new(sources)
    }

    /// Resolve boards for `platforms`.
    pub fn resolve(&self, platforms: &[String]) -> ResolvedBoards {
        for source in &self.sources {
            match source.boards_for(platforms) {
                Ok(boards) if !boards.is_empty() => {
                    debug!(
                        "Resolved {} board(s) for {:?} from {} source",
                        boards.len(),
                        platforms,
                        source.name()
                    );
                    return ResolvedBoards {
                        boards,
                        source: Some(source.name().to_string()),
                    };
                }
                Ok(_) => {
                    debug!("{} source has no boards for {:?}", source.name(), platforms);
                }
                Err(e) => {
                    warn!("{} board source unavailable: {}", source.name(), e);
                }
            }
        }
        ResolvedBoards {
            boards: Vec::new(),
            source: None,
        }
    }
}

impl Default for BoardResolver {
    fn default() -> Self {
        Self::with_catalog(None)
    }
}
