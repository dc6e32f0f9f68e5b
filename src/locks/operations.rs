//! Lock acquisition, listing, and clearing operations.

use super::guard::LockGuard;
use super::metadata::LockMetadata;
use super::types::{LockInfo, LockType};
use crate::context::RepoContext;
use crate::error::{RepokitError, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Outcome of an exclusive-create attempt.
enum Contention {
    /// Someone else holds the lock; carries a description of the holder.
    Held(String),
    Failed(String),
}

/// Create `lock_path` exclusively and write `metadata` into it.
fn try_acquire(lock_path: &Path, metadata: &LockMetadata) -> std::result::Result<LockGuard, Contention> {
    if let Some(parent) = lock_path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            Contention::Failed(format!(
                "failed to create locks directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                let holder = match LockMetadata::from_file(lock_path) {
                    Ok(meta) => meta.describe(lock_path),
                    Err(_) => format!("lock file {} exists", lock_path.display()),
                };
                Contention::Held(holder)
            } else {
                Contention::Failed(format!(
                    "failed to acquire lock '{}': {}",
                    lock_path.display(),
                    e
                ))
            }
        })?;

    let json = metadata
        .to_json()
        .map_err(|e| Contention::Failed(e.to_string()))?;
    file.write_all(json.as_bytes()).map_err(|e| {
        let _ = fs::remove_file(lock_path);
        Contention::Failed(format!("failed to write lock metadata: {}", e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(lock_path);
        Contention::Failed(format!("failed to sync lock file: {}", e))
    })?;

    debug!(lock = %lock_path.display(), action = %metadata.action, "lock acquired");
    Ok(LockGuard::new(lock_path.to_path_buf()))
}

const CLEAR_HINT: &str = "If the holder is gone, inspect with `repokit lock list` and remove it with `repokit lock clear <name> --force`.";

/// Acquire the repository operation lock.
///
/// # Returns
///
/// * `Ok(LockGuard)` - Successfully acquired lock
/// * `Err(RepokitError::LockError)` - Lock already held (exit code 4)
pub fn acquire_repository_lock(ctx: &RepoContext, action: &str) -> Result<LockGuard> {
    let metadata = LockMetadata::new(action);
    try_acquire(&ctx.repository_lock_path(), &metadata).map_err(|c| match c {
        Contention::Held(holder) => RepokitError::LockError(format!(
            "repository lock is held by another process: {}\n{}",
            holder, CLEAR_HINT
        )),
        Contention::Failed(msg) => RepokitError::LockError(msg),
    })
}

/// Acquire the lock for one branch's working copy.
///
/// # Returns
///
/// * `Ok(LockGuard)` - Successfully acquired lock
/// * `Err(RepokitError::BranchLocked)` - Another process holds it (exit code 4)
pub fn acquire_branch_lock(ctx: &RepoContext, branch: &str, action: &str) -> Result<LockGuard> {
    let metadata = LockMetadata::new(action);
    try_acquire(&ctx.branch_lock_path(branch), &metadata).map_err(|c| match c {
        Contention::Held(holder) => RepokitError::BranchLocked {
            branch: branch.to_string(),
            reason: format!("{}\n{}", holder, CLEAR_HINT),
        },
        Contention::Failed(msg) => RepokitError::LockError(msg),
    })
}

/// Recover the lock type and display name from a lock file stem.
fn classify_lock_file(stem: &str) -> (LockType, String) {
    match stem.strip_prefix("branch-") {
        Some(branch) => (LockType::Branch, branch.replace("__", "/")),
        None => (LockType::Repository, stem.to_string()),
    }
}

/// List all active locks, sorted by name.
pub fn list_locks(ctx: &RepoContext, stale_minutes: u32) -> Result<Vec<LockInfo>> {
    let mut locks = Vec::new();

    if !ctx.locks_dir.exists() {
        return Ok(locks);
    }

    let entries = fs::read_dir(&ctx.locks_dir).map_err(|e| {
        RepokitError::UserError(format!(
            "failed to read locks directory '{}': {}",
            ctx.locks_dir.display(),
            e
        ))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            RepokitError::UserError(format!("failed to read locks directory entry: {}", e))
        })?;

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("lock") {
            continue;
        }

        let metadata = match LockMetadata::from_file(&path) {
            Ok(meta) => meta,
            Err(_) => continue,
        };

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let (lock_type, name) = classify_lock_file(stem);
        let is_stale = metadata.is_stale(stale_minutes);

        locks.push(LockInfo {
            path,
            name,
            lock_type,
            metadata,
            is_stale,
        });
    }

    locks.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(locks)
}

/// Remove a lock file.
///
/// `lock_id` is `repository` or a branch name. The caller decides whether
/// clearing is appropriate (e.g. `--force`).
pub fn clear_lock(ctx: &RepoContext, lock_id: &str, stale_minutes: u32) -> Result<LockInfo> {
    let (lock_path, lock_type) = if lock_id == LockType::Repository.as_str() {
        (ctx.repository_lock_path(), LockType::Repository)
    } else {
        (ctx.branch_lock_path(lock_id), LockType::Branch)
    };

    if !lock_path.exists() {
        return Err(RepokitError::UserError(format!(
            "lock '{}' does not exist at: {}",
            lock_id,
            lock_path.display()
        )));
    }

    let metadata = LockMetadata::from_file(&lock_path)?;
    let is_stale = metadata.is_stale(stale_minutes);

    let lock_info = LockInfo {
        path: lock_path.clone(),
        name: lock_id.to_string(),
        lock_type,
        metadata,
        is_stale,
    };

    fs::remove_file(&lock_path).map_err(|e| {
        RepokitError::UserError(format!(
            "failed to clear lock '{}': {}",
            lock_path.display(),
            e
        ))
    })?;

    Ok(lock_info)
}
