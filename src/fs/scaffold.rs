//! Directory scaffolding helpers.

use crate::error::{RepokitError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder file that lets git track an otherwise empty directory.
pub const GITKEEP: &str = ".gitkeep";

/// Create `dir` (and parents) and drop a `.gitkeep` into it if the directory
/// has no entries.
///
/// Returns every path this call created, outermost first, so a rollback can
/// remove exactly those.
pub fn ensure_dir_with_gitkeep(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();

    let mut missing = Vec::new();
    let mut cursor = Some(dir);
    while let Some(path) = cursor {
        if path.exists() {
            break;
        }
        missing.push(path.to_path_buf());
        cursor = path.parent();
    }
    missing.reverse();

    fs::create_dir_all(dir).map_err(|e| {
        RepokitError::UserError(format!(
            "failed to create directory '{}': {}",
            dir.display(),
            e
        ))
    })?;
    created.extend(missing);

    let is_empty = fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty {
        let keep = dir.join(GITKEEP);
        fs::write(&keep, b"").map_err(|e| {
            RepokitError::UserError(format!("failed to write '{}': {}", keep.display(), e))
        })?;
        created.push(keep);
    }

    Ok(created)
}

/// Remove a created path: files unconditionally, directories only when empty.
///
/// Returns `Ok(false)` when a directory was left because it is not empty.
pub fn remove_if_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    let outcome = if path.is_dir() {
        match fs::remove_dir(path) {
            Ok(()) => return Ok(true),
            Err(_) if fs::read_dir(path).map(|mut e| e.next().is_some()).unwrap_or(false) => {
                return Ok(false);
            }
            Err(e) => Err(e),
        }
    } else {
        fs::remove_file(path)
    };
    outcome.map(|_| true).map_err(|e| {
        RepokitError::UserError(format!("failed to remove '{}': {}", path.display(), e))
    })
}
