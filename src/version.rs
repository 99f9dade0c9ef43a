//! # Version Marker
//!
//! Each build branch carries a `_version.json` file at its root holding the
//! library version it was last published for, exactly as the registry
//! described it. The marker drives the idempotency check: a publish whose
//! requested version equals the staged one is skipped.

use crate::error::{Error, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;

/// File name of the version marker at the root of a build branch.
pub const VERSION_FILENAME: &str = "_version.json";

/// A library version as returned by the registry.
///
/// Only `name` is interpreted; every other field is carried through to the
/// marker untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryVersion(Value);

impl LibraryVersion {
    /// Wrap a registry version document. It must be an object with a string
    /// or numeric `name`.
    pub fn new(value: Value) -> Result<Self> {
        let version = Self(value);
        version.validate()?;
        Ok(version)
    }

    /// A version that only has a name.
    pub fn named(name: &str) -> Self {
        Self(serde_json::json!({ "name": name }))
    }

    fn validate(&self) -> Result<()> {
        let Some(object) = self.0.as_object() else {
            return Err(Error::InvalidVersion {
                message: format!("expected an object, got {}", self.0),
            });
        };
        match object.get("name") {
            Some(Value::String(_)) | Some(Value::Number(_)) => Ok(()),
            Some(other) => Err(Error::InvalidVersion {
                message: format!("'name' must be a string or number, got {}", other),
            }),
            None => Err(Error::InvalidVersion {
                message: "missing 'name'".to_string(),
            }),
        }
    }

    /// The version name used in commit messages and the install command.
    pub fn name(&self) -> String {
        match self.0.get("name") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// The full version document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Result of comparing the staged marker with a requested version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagedCheck {
    /// The branch needs (re)publishing.
    Proceed,
    /// The branch already holds the requested version.
    Skip,
}

/// Read the staged version marker in `checkout`, if any.
///
/// A marker that is not valid JSON is reported as absent so the next publish
/// overwrites it.
pub fn read_staged(checkout: &Path) -> Result<Option<Value>> {
    let path = checkout.join(VERSION_FILENAME);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    match serde_json::from_str(&content) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!("Ignoring unreadable {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

/// Decide whether `requested` still needs publishing into `checkout`.
pub fn check_staged(checkout: &Path, requested: &LibraryVersion, force: bool) -> Result<StagedCheck> {
    if force {
        return Ok(StagedCheck::Proceed);
    }
    match read_staged(checkout)? {
        Some(staged) if &staged == requested.as_value() => Ok(StagedCheck::Skip),
        _ => Ok(StagedCheck::Proceed),
    }
}

/// Write the marker, pretty-printed with two-space indentation.
pub fn write_marker(checkout: &Path, version: &LibraryVersion) -> Result<()> {
    let mut content = serde_json::to_string_pretty(version.as_value())?;
    content.push('\n');
    fs::write(checkout.join(VERSION_FILENAME), content)?;
    Ok(())
}
