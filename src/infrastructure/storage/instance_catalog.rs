//! Instance discovery on disk.
//!
//! The instance root holds one sub-directory per set (`easy`, `hard`, ...).
//! A set expression joins set names with `+`; every regular file below each
//! named directory is an instance. Symlinks are followed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::InstanceIndex;

const SET_SEPARATOR: char = '+';

/// Split `easy+hard` into its set names, dropping empty pieces.
pub fn set_names(expression: &str) -> Vec<&str> {
    expression
        .split(SET_SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Resolve a set expression against `root`.
///
/// Paths come back sorted and de-duplicated. A set whose directory is
/// missing is an error; an empty set is not.
pub fn resolve_sets(root: &Path, expression: &str) -> DomainResult<Vec<PathBuf>> {
    let names = set_names(expression);
    if names.is_empty() {
        return Err(DomainError::ValidationFailed(format!(
            "empty instance set expression: {expression:?}"
        )));
    }

    let mut files = Vec::new();
    for name in names {
        let dir = root.join(name);
        if !dir.is_dir() {
            return Err(DomainError::InstanceNotFound(format!(
                "instance set '{name}' ({})",
                dir.display()
            )));
        }
        let before = files.len();
        collect_files(&dir, &mut files, &mut HashSet::new())?;
        tracing::debug!(set = name, instances = files.len() - before, "instance set resolved");
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Index every instance file below `root`, for looking instances up by name.
pub fn build_index(root: &Path) -> DomainResult<InstanceIndex> {
    let mut files = Vec::new();
    if root.is_dir() {
        collect_files(root, &mut files, &mut HashSet::new())?;
    } else {
        tracing::warn!(root = %root.display(), "instance root missing; solutions will not be verified");
    }
    files.sort();
    Ok(files.into_iter().collect())
}

fn collect_files(
    dir: &Path,
    out: &mut Vec<PathBuf>,
    visited: &mut HashSet<PathBuf>,
) -> DomainResult<()> {
    // Symlinked directories can form cycles.
    let canonical = dir.canonicalize().map_err(|e| DomainError::io(dir, e))?;
    if !visited.insert(canonical) {
        return Ok(());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| DomainError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| DomainError::io(dir, e))?;
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        // `metadata` follows symlinks; dangling links are skipped.
        let Ok(metadata) = std::fs::metadata(&path) else {
            tracing::debug!(path = %path.display(), "skipping dangling link");
            continue;
        };
        if metadata.is_dir() {
            collect_files(&path, out, visited)?;
        } else if metadata.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}
