//! Branch operations (create, check existence, delete).

use crate::error::{RepokitError, Result};
use crate::git::run_git;
use std::path::Path;

/// Check if a branch exists locally.
pub fn branch_exists<P: AsRef<Path>>(repo_root: P, branch: &str) -> Result<bool> {
    Ok(branch_tip(repo_root, branch)?.is_some())
}

/// Commit SHA a local branch points at, or `None` if the branch does not exist.
pub fn branch_tip<P: AsRef<Path>>(repo_root: P, branch: &str) -> Result<Option<String>> {
    let output = run_git(
        repo_root,
        &[
            "rev-parse",
            "--verify",
            "-q",
            &format!("refs/heads/{}^{{commit}}", branch),
        ],
    );
    Ok(output.ok().map(|o| o.stdout).filter(|s| !s.is_empty()))
}

/// Create a new branch at the specified commit.
///
/// # Returns
///
/// * `Ok(())` - Branch created successfully
/// * `Err(RepokitError::GitError)` - Failed to create branch (exit code 3)
pub fn create_branch<P: AsRef<Path>>(repo_root: P, branch: &str, start: &str) -> Result<()> {
    run_git(repo_root, &["branch", branch, start]).map_err(|e| {
        RepokitError::GitError(format!(
            "failed to create branch '{}' at {}: {}",
            branch, start, e
        ))
    })?;
    Ok(())
}

/// Delete a branch.
///
/// Uses `git branch -d` unless `force` is set. Rollback uses force because the
/// branches it removes were created by the failed operation itself.
pub fn delete_branch<P: AsRef<Path>>(repo_root: P, branch: &str, force: bool) -> Result<()> {
    let delete_flag = if force { "-D" } else { "-d" };

    run_git(repo_root, &["branch", delete_flag, branch]).map_err(|e| {
        RepokitError::GitError(format!("failed to delete branch '{}': {}", branch, e))
    })?;

    Ok(())
}

/// All local branches with their tip SHAs, sorted by name.
pub fn list_branches<P: AsRef<Path>>(repo_root: P) -> Result<Vec<(String, String)>> {
    let output = run_git(
        repo_root,
        &[
            "for-each-ref",
            "--format=%(refname:short) %(objectname)",
            "refs/heads",
        ],
    )?;

    Ok(output
        .lines()
        .into_iter()
        .filter_map(|line| {
            let (name, sha) = line.rsplit_once(' ')?;
            Some((name.to_string(), sha.to_string()))
        })
        .collect())
}
