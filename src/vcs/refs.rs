//! Ref reads and compare-and-swap ref updates.

use crate::error::{RepokitError, Result};
use crate::git::{GitInvocation, run_git, run_git_status};
use std::path::Path;
use tracing::debug;

use super::worktree::find_worktree_for_branch;

/// A ref and the object it points at.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RefEntry {
    /// Full ref name, e.g. `refs/heads/main`.
    pub name: String,
    pub sha: String,
}

/// Object a ref points at, or `None` if it does not exist.
pub fn read_ref<P: AsRef<Path>>(repo: P, refname: &str) -> Result<Option<String>> {
    let (code, output) = run_git_status(
        repo,
        &["rev-parse", "--verify", "-q", refname],
        &GitInvocation::default(),
    )?;
    Ok(if code == 0 && !output.is_empty() {
        Some(output.stdout)
    } else {
        None
    })
}

/// Every ref under the given prefixes (e.g. `refs/heads`).
pub fn list_refs<P: AsRef<Path>>(repo: P, prefixes: &[&str]) -> Result<Vec<RefEntry>> {
    let mut args = vec!["for-each-ref", "--format=%(refname) %(objectname)"];
    args.extend_from_slice(prefixes);
    let output = run_git(repo, &args)?;

    Ok(output
        .lines()
        .into_iter()
        .filter_map(|line| {
            let (name, sha) = line.rsplit_once(' ')?;
            Some(RefEntry {
                name: name.to_string(),
                sha: sha.to_string(),
            })
        })
        .collect())
}

/// Point `refname` at `new`.
///
/// With `old` set the update only happens if the ref still points there
/// (an empty `old` asserts the ref does not exist yet).
pub fn update_ref<P: AsRef<Path>>(
    repo: P,
    refname: &str,
    new: &str,
    old: Option<&str>,
    reason: &str,
) -> Result<()> {
    let message = format!("repokit: {}", reason);
    let mut args = vec!["update-ref", "-m", message.as_str(), refname, new];
    if let Some(old) = old {
        args.push(old);
    }
    run_git(repo, &args).map_err(|e| {
        RepokitError::GitError(format!("failed to update {} to {}: {}", refname, new, e))
    })?;
    Ok(())
}

/// Delete `refname`.
pub fn delete_ref<P: AsRef<Path>>(repo: P, refname: &str) -> Result<()> {
    run_git(repo, &["update-ref", "-d", refname])?;
    Ok(())
}

/// Move `branch` from `expected_old` to `new`, which must descend from it.
///
/// If the branch is checked out in a working copy the move is a fast-forward
/// merge there so the files on disk follow; otherwise only the ref is updated.
/// Either way the update fails if the branch no longer points at
/// `expected_old`.
pub fn advance_branch<P: AsRef<Path>>(
    repo: P,
    branch: &str,
    new: &str,
    expected_old: &str,
    reason: &str,
) -> Result<()> {
    let repo = repo.as_ref();

    if let Some(worktree) = find_worktree_for_branch(repo, branch)? {
        if worktree.head_sha != expected_old {
            return Err(RepokitError::GitError(format!(
                "branch '{}' moved during the operation (expected {}, found {})",
                branch, expected_old, worktree.head_sha
            )));
        }
        debug!(branch, path = %worktree.path.display(), "fast-forwarding checked-out branch");
        run_git(&worktree.path, &["merge", "--ff-only", "--quiet", new]).map_err(|e| {
            RepokitError::GitError(format!(
                "failed to fast-forward '{}' in {}: {}",
                branch,
                worktree.path.display(),
                e
            ))
        })?;
        return Ok(());
    }

    update_ref(
        repo,
        &format!("refs/heads/{}", branch),
        new,
        Some(expected_old),
        reason,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{commit_file, create_test_repo, git, git_stdout};

    #[test]
    fn test_update_ref_compare_and_swap() {
        let temp_dir = create_test_repo();
        let path = temp_dir.path();
        let head = git_stdout(path, &["rev-parse", "HEAD"]);

        update_ref(path, "refs/repokit/promoted/main", &head, Some(""), "test").unwrap();
        assert_eq!(
            read_ref(path, "refs/repokit/promoted/main").unwrap(),
            Some(head.clone())
        );

        // Creating again with "must not exist" fails.
        assert!(update_ref(path, "refs/repokit/promoted/main", &head, Some(""), "test").is_err());

        let refs = list_refs(path, &["refs/repokit"]).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "refs/repokit/promoted/main");

        delete_ref(path, "refs/repokit/promoted/main").unwrap();
        assert_eq!(read_ref(path, "refs/repokit/promoted/main").unwrap(), None);
    }

    #[test]
    fn test_advance_branch_not_checked_out() {
        let temp_dir = create_test_repo();
        let path = temp_dir.path();
        let old = git_stdout(path, &["rev-parse", "HEAD"]);
        git(path, &["branch", "dev"]);
        let new = commit_file(path, "a.txt", "a\n", "a");

        advance_branch(path, "dev", &new, &old, "promote").unwrap();
        assert_eq!(git_stdout(path, &["rev-parse", "dev"]), new);

        // Stale expectation is refused.
        assert!(advance_branch(path, "dev", &old, &old, "promote").is_err());
    }

    #[test]
    fn test_advance_branch_updates_checked_out_files() {
        let temp_dir = create_test_repo();
        let path = temp_dir.path();
        let old = git_stdout(path, &["rev-parse", "HEAD"]);
        git(path, &["checkout", "-q", "-b", "side"]);
        let new = commit_file(path, "a.txt", "a\n", "a");
        git(path, &["checkout", "-q", "main"]);
        assert!(!path.join("a.txt").exists());

        advance_branch(path, "main", &new, &old, "promote").unwrap();
        assert!(path.join("a.txt").exists());
    }
}
