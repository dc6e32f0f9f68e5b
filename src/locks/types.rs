//! Lock type definitions and information structures.

use super::metadata::LockMetadata;
use std::path::PathBuf;

/// Type of lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    /// Repository operation lock serializing adopt/promote/cascade/publish.
    Repository,
    /// Per-branch lock guarding one branch's working copy and ref.
    Branch,
}

impl LockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockType::Repository => "repository",
            LockType::Branch => "branch",
        }
    }
}

/// Information about an active lock.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The lock file path.
    pub path: PathBuf,

    /// `repository` or the branch name.
    pub name: String,

    pub lock_type: LockType,

    pub metadata: LockMetadata,

    /// Whether the lock is older than the configured stale threshold.
    pub is_stale: bool,
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] (owner: {}, age: {}, action: {}{})",
            self.name,
            self.lock_type.as_str(),
            self.metadata.owner,
            self.metadata.age_string(),
            self.metadata.action,
            if self.is_stale { ", STALE" } else { "" }
        )
    }
}
