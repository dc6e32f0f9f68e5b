//! Atomic file writes for repokit state.
//!
//! The state marker, snapshot backups and generated exclude files are written
//! to a temporary sibling, synced, then renamed over the target, so a crash
//! never leaves a half-written file behind. On crash a `.{filename}.tmp` file
//! may remain next to the target.

use crate::error::{RepokitError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file, creating parent directories as needed.
///
/// # Example
///
/// ```no_run
/// use repokit::fs::atomic_write;
/// use std::path::Path;
///
/// atomic_write(Path::new(".git/repokit/state.yaml"), b"phase: managed\n")?;
/// # Ok::<(), repokit::error::RepokitError>(())
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            RepokitError::UserError(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content)?;
    replace(&temp_path, path)
}

/// Atomically write a string to a file.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            RepokitError::UserError(format!("invalid file path '{}'", target.display()))
        })?;

    Ok(parent.join(format!(".{}.tmp", filename)))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        RepokitError::UserError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        RepokitError::UserError(format!("failed to write to temporary file: {}", e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        RepokitError::UserError(format!("failed to sync temporary file to disk: {}", e))
    })?;

    Ok(())
}

fn replace(source: &Path, target: &Path) -> Result<()> {
    // rename() replaces an existing target atomically on POSIX; on Windows it
    // fails for an existing target, so clear it first there.
    #[cfg(windows)]
    if target.exists() {
        let _ = fs::remove_file(target);
    }

    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        RepokitError::UserError(format!(
            "failed to atomically replace '{}': {}",
            target.display(),
            e
        ))
    })?;

    #[cfg(unix)]
    if let Some(parent) = target.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("state.yaml");

        atomic_write(&file_path, b"phase: adopting\n").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "phase: adopting\n");
    }

    #[test]
    fn test_atomic_write_replace_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("state.yaml");
        fs::write(&file_path, "phase: adopting\n").unwrap();

        atomic_write_file(&file_path, "phase: managed\n").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "phase: managed\n");
        assert!(!temp_dir.path().join(".state.yaml.tmp").exists());
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("repokit").join("backups").join("1.json");

        atomic_write(&file_path, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{}");
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let temp = temp_path_for(Path::new("/some/path/file.txt")).unwrap();
        assert_eq!(temp, Path::new("/some/path/.file.txt.tmp"));
    }

    #[test]
    fn test_atomic_write_empty_content() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("exclude");

        atomic_write(&file_path, b"").unwrap();

        assert!(fs::read(&file_path).unwrap().is_empty());
    }
}
