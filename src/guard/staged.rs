//! Reading the index of a working copy.

use super::classify::PrivateContentGuard;
use super::types::{CommitClassification, StagedChange};
use crate::error::{RepokitError, Result};
use crate::git::run_git;
use crate::vcs::{head_branch, staged_paths};
use std::path::Path;

/// Staged additions and modifications in `worktree`, with blob sizes.
///
/// With `read_content` set, text blobs no larger than `content_limit` bytes
/// are loaded for scanning.
pub fn read_staged_changes(
    worktree: &Path,
    read_content: bool,
    content_limit: u64,
) -> Result<Vec<StagedChange>> {
    let mut changes = Vec::new();
    for path in staged_paths(worktree)? {
        let spec = format!(":{}", path);
        let size_output = run_git(worktree, &["cat-file", "-s", &spec])?;
        let size: u64 = size_output.stdout.parse().map_err(|_| {
            RepokitError::GitError(format!(
                "unexpected blob size '{}' for {}",
                size_output.stdout, path
            ))
        })?;

        let content = if read_content && size <= content_limit {
            let blob = run_git(worktree, &["cat-file", "blob", &spec])?;
            (!blob.stdout.contains('\0')).then_some(blob.stdout)
        } else {
            None
        };

        changes.push(StagedChange {
            path,
            size,
            content,
        });
    }
    Ok(changes)
}

impl PrivateContentGuard<'_> {
    /// Validate the index of `worktree` for the branch checked out there.
    pub fn validate_staged(&self, worktree: &Path) -> Result<CommitClassification> {
        let branch = head_branch(worktree)?.ok_or_else(|| {
            RepokitError::UserError(format!(
                "{} has a detached HEAD; check out a branch before committing",
                worktree.display()
            ))
        })?;
        self.validate_staged_on(worktree, &branch)
    }

    /// Validate the index of `worktree` as a candidate commit on `branch`.
    pub fn validate_staged_on(&self, worktree: &Path, branch: &str) -> Result<CommitClassification> {
        let read_content = self.graph().is_public(branch) && self.scans_content();
        let staged = read_staged_changes(worktree, read_content, self.max_file_bytes())?;
        self.validate(branch, &staged)
    }
}
