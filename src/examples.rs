//! Example sketches: where a library's stored examples live and how they are
//! staged into a build branch.

use crate::error::{Error, Result};
use log::{debug, info};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory inside a build branch that holds the staged examples.
pub const EXAMPLES_DIR: &str = "examples";

/// Location of a library's stored examples below the storage root.
///
/// Libraries are bucketed by hundreds of ids: `libraries/examples/<id / 100>/<id>`.
pub fn example_relpath(library_id: u64) -> Result<PathBuf> {
    if library_id == 0 {
        return Err(Error::InvalidLibraryId { id: library_id });
    }
    Ok(PathBuf::from("libraries")
        .join("examples")
        .join((library_id / 100).to_string())
        .join(library_id.to_string()))
}

/// Absolute location of a library's stored examples.
pub fn example_dir(storage_root: &Path, library_id: u64) -> Result<PathBuf> {
    Ok(storage_root.join(example_relpath(library_id)?))
}

/// Files of `source` that would be staged, sorted by name.
fn example_files(source: &Path, library_id: u64) -> Result<Vec<OsString>> {
    if !source.is_dir() {
        return Err(Error::ExamplesNotFound {
            library_id,
            path: source.to_path_buf(),
        });
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        // follows symlinks, so linked sketches are staged as regular files
        if !entry.path().is_file() {
            debug!("Skipping non-file example entry {}", entry.path().display());
            continue;
        }
        names.push(entry.file_name());
    }
    names.sort();
    Ok(names)
}

fn staged_path(name: &OsStr) -> String {
    format!("{}/{}", EXAMPLES_DIR, name.to_string_lossy())
}

/// Branch-relative paths the files in `source` would be staged under, without
/// copying anything.
pub fn planned_paths(source: &Path, library_id: u64) -> Result<Vec<String>> {
    Ok(example_files(source, library_id)?
        .iter()
        .map(|name| staged_path(name))
        .collect())
}

/// Replace `<checkout>/examples` with a flat copy of the files in `source`.
///
/// Returns repository-relative paths (`examples/<file>`), sorted by file name.
/// Symlinks to files are copied as regular files; subdirectories and dangling
/// links are not copied.
pub fn stage_examples(checkout: &Path, source: &Path, library_id: u64) -> Result<Vec<String>> {
    let names = example_files(source, library_id)?;

    let target = checkout.join(EXAMPLES_DIR);
    if target.exists() {
        fs::remove_dir_all(&target)?;
    }
    fs::create_dir_all(&target)?;

    let mut staged = Vec::with_capacity(names.len());
    for name in names {
        fs::copy(source.join(&name), target.join(&name))?;
        staged.push(staged_path(&name));
    }

    info!(
        "Staged {} example(s) for library {} from {}",
        staged.len(),
        library_id,
        source.display()
    );
    Ok(staged)
}
