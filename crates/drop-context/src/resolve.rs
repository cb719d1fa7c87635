//! Mapping logical paths to physical files.
//!
//! A logical path either names a file directly (`guide.md`) or omits the
//! extension (`guide`), in which case the single sibling file named
//! `guide.<anything>` is used. A file named exactly `guide` takes precedence
//! over the scan. More than one candidate is an error: the resolver never
//! guesses.

use std::io;
use std::path::{Path, PathBuf};

use crate::ProcessError;

/// Resolve a logical path to the physical file to process.
///
/// An existing regular file always wins. Otherwise a path without an
/// extension falls back to `<name>.<anything>`.
///
/// Returns `Ok(None)` when nothing matches.
pub async fn lookup_real_file(path: &Path) -> Result<Option<PathBuf>, ProcessError> {
    if is_file(path).await {
        return Ok(Some(path.to_path_buf()));
    }
    if path.extension().is_some() {
        return Ok(None);
    }
    find_file_with_arbitrary_extension(path).await
}

/// Find the single file in `path`'s directory named `<file name>.<anything>`.
///
/// A missing directory counts as no match.
pub async fn find_file_with_arbitrary_extension(
    path: &Path,
) -> Result<Option<PathBuf>, ProcessError> {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = format!("{file_name}.");

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ProcessError::io(dir, e)),
    };

    let mut candidates = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ProcessError::io(dir, e))?
    {
        let name = entry.file_name();
        let matches = name.to_str().is_some_and(|n| n.starts_with(&prefix));
        if matches && entry.file_type().await.is_ok_and(|t| t.is_file()) {
            candidates.push(dir.join(name));
        }
    }
    candidates.sort();

    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        _ => Err(ProcessError::AmbiguousFile {
            path: path.to_path_buf(),
            candidates,
        }),
    }
}

/// Output file name for a page source file.
///
/// Drops the last extension only when there is more than one, so the final
/// processing step's extension disappears while a plain file keeps its name:
///
/// - `user-guide` → `user-guide`
/// - `user-guide.pdf` → `user-guide.pdf`
/// - `user-guide.pdf.html` → `user-guide.pdf`
#[must_use]
pub fn destination_file_name(file_name: &str) -> &str {
    if file_name.split('.').count() <= 2 {
        return file_name;
    }
    file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}
