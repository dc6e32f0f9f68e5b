//! Worktree creation, listing, and removal.

use crate::error::{RepokitError, Result};
use crate::git::run_git;
use std::path::{Path, PathBuf};

/// Information about an existing worktree.
#[derive(Debug, Clone)]
pub struct ExistingWorktree {
    /// Path to the worktree.
    pub path: PathBuf,
    /// Branch the worktree is on.
    pub branch: Option<String>,
    /// HEAD commit SHA (empty for an unborn branch).
    pub head_sha: String,
}

/// List all worktrees in the repository. The main working copy comes first.
pub fn list_worktrees<P: AsRef<Path>>(repo_root: P) -> Result<Vec<ExistingWorktree>> {
    let output = run_git(repo_root, &["worktree", "list", "--porcelain"])?;

    let mut worktrees = Vec::new();
    let mut current: Option<ExistingWorktree> = None;

    for line in output.stdout.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(done) = current.take() {
                worktrees.push(done);
            }
            current = Some(ExistingWorktree {
                path: PathBuf::from(path),
                branch: None,
                head_sha: String::new(),
            });
        } else if let Some(wt) = current.as_mut() {
            if let Some(sha) = line.strip_prefix("HEAD ") {
                wt.head_sha = sha.to_string();
            } else if let Some(branch_ref) = line.strip_prefix("branch ") {
                wt.branch = branch_ref.strip_prefix("refs/heads/").map(String::from);
            }
        }
    }

    if let Some(done) = current {
        worktrees.push(done);
    }

    Ok(worktrees)
}

/// Find the worktree that has `branch` checked out.
pub fn find_worktree_for_branch<P: AsRef<Path>>(
    repo_root: P,
    branch: &str,
) -> Result<Option<ExistingWorktree>> {
    let worktrees = list_worktrees(repo_root)?;

    Ok(worktrees
        .into_iter()
        .find(|wt| wt.branch.as_deref() == Some(branch)))
}

/// Create a new worktree for an existing branch.
///
/// # Returns
///
/// * `Ok(())` - Worktree created successfully
/// * `Err(RepokitError::GitError)` - Failed to create worktree (exit code 3)
pub fn create_worktree<P: AsRef<Path>>(
    repo_root: P,
    worktree_path: &Path,
    branch: &str,
) -> Result<()> {
    let worktree_str = worktree_path.to_string_lossy();

    if let Some(parent) = worktree_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            RepokitError::GitError(format!(
                "failed to create worktrees directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    run_git(repo_root, &["worktree", "add", &worktree_str, branch]).map_err(|e| {
        RepokitError::GitError(format!(
            "failed to create worktree at '{}' for branch '{}': {}",
            worktree_str, branch, e
        ))
    })?;

    Ok(())
}

/// Remove a worktree.
///
/// `force` discards local modifications; rollback only uses it on worktrees the
/// failed operation created.
pub fn remove_worktree<P: AsRef<Path>>(
    repo_root: P,
    worktree_path: &Path,
    force: bool,
) -> Result<()> {
    let worktree_str = worktree_path.to_string_lossy();

    let args: Vec<&str> = if force {
        vec!["worktree", "remove", "--force", &worktree_str]
    } else {
        vec!["worktree", "remove", &worktree_str]
    };

    run_git(repo_root, &args).map_err(|e| {
        RepokitError::GitError(format!(
            "failed to remove worktree '{}': {}",
            worktree_str, e
        ))
    })?;

    Ok(())
}

/// Move the index and files of `worktree` from tree `from` to tree `to`.
///
/// Used after a branch ref moved underneath its checked-out working copy.
/// Local modifications to files that differ between the two trees make git
/// refuse, leaving the working copy untouched.
pub fn sync_checkout<P: AsRef<Path>>(worktree: P, from: &str, to: &str) -> Result<()> {
    let worktree = worktree.as_ref();
    run_git(worktree, &["read-tree", "-m", "-u", from, to]).map_err(|e| {
        RepokitError::GitError(format!(
            "failed to update working copy '{}': {}",
            worktree.display(),
            e
        ))
    })?;
    Ok(())
}

/// Check if two paths are equivalent (handling symlinks, case, etc.).
pub fn paths_equivalent(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a_canon), Ok(b_canon)) => a_canon == b_canon,
        _ => a == b,
    }
}
