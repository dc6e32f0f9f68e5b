//! Repository init plus staging and committing in a working copy.

use crate::error::{RepokitError, Result};
use crate::git::{GitInvocation, run_git, run_git_status};
use std::path::Path;

/// Returns true if `root` is itself the top of a git working copy.
pub fn is_git_repository<P: AsRef<Path>>(root: P) -> bool {
    root.as_ref().join(".git").exists()
}

/// Initialize a repository at `root` whose unborn HEAD is `initial_branch`.
///
/// Returns `true` when a fresh `.git` was created, `false` if one already
/// existed (HEAD is left alone in that case).
pub fn init_repository<P: AsRef<Path>>(root: P, initial_branch: &str) -> Result<bool> {
    let root = root.as_ref();
    if is_git_repository(root) {
        return Ok(false);
    }

    std::fs::create_dir_all(root).map_err(|e| {
        RepokitError::UserError(format!(
            "failed to create repository directory '{}': {}",
            root.display(),
            e
        ))
    })?;

    run_git(root, &["init", "--quiet"])?;
    run_git(
        root,
        &[
            "symbolic-ref",
            "HEAD",
            &format!("refs/heads/{}", initial_branch),
        ],
    )?;
    Ok(true)
}

/// Name of the branch checked out in `worktree`, including an unborn one.
///
/// Returns `None` for a detached HEAD.
pub fn head_branch<P: AsRef<Path>>(worktree: P) -> Result<Option<String>> {
    let (code, output) = run_git_status(
        worktree,
        &["symbolic-ref", "--short", "-q", "HEAD"],
        &GitInvocation::default(),
    )?;
    Ok(if code == 0 && !output.is_empty() {
        Some(output.stdout)
    } else {
        None
    })
}

/// Resolve `rev` to a commit SHA, or `None` if it does not name a commit.
pub fn rev_parse<P: AsRef<Path>>(repo: P, rev: &str) -> Result<Option<String>> {
    let (code, output) = run_git_status(
        repo,
        &["rev-parse", "--verify", "-q", &format!("{}^{{commit}}", rev)],
        &GitInvocation::default(),
    )?;
    Ok(if code == 0 && !output.is_empty() {
        Some(output.stdout)
    } else {
        None
    })
}

/// Stage every change in the working copy, honouring ignore and exclude rules.
pub fn stage_all<P: AsRef<Path>>(worktree: P) -> Result<()> {
    run_git(worktree, &["add", "-A"])?;
    Ok(())
}

/// Stage exactly `paths` (relative to `worktree`), even if they are ignored.
///
/// Used for files repokit created itself, so nested worktree directories and
/// unrelated files in the working copy are never swept in.
pub fn stage_paths<P: AsRef<Path>>(worktree: P, paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }
    let mut args = vec!["add", "-f", "--"];
    args.extend(paths.iter().map(String::as_str));
    run_git(worktree, &args)?;
    Ok(())
}

/// Untracked files of `worktree` that ignore and exclude rules let through.
pub fn untracked_paths<P: AsRef<Path>>(worktree: P) -> Result<Vec<String>> {
    let output = run_git(
        worktree,
        &[
            "-c",
            "core.quotePath=false",
            "ls-files",
            "--others",
            "--exclude-standard",
        ],
    )?;
    Ok(output.lines().into_iter().map(String::from).collect())
}

/// Remove `paths` from the index of `worktree`, leaving the files on disk.
pub fn unstage_paths<P: AsRef<Path>>(worktree: P, paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }
    let mut args = vec!["rm", "--cached", "-r", "-q", "--ignore-unmatch", "--"];
    args.extend(paths.iter().map(String::as_str));
    run_git(worktree, &args)?;
    Ok(())
}

/// Point HEAD of `worktree` at `branch` without touching the index or files.
pub fn set_head<P: AsRef<Path>>(worktree: P, branch: &str) -> Result<()> {
    run_git(
        worktree,
        &["symbolic-ref", "HEAD", &format!("refs/heads/{}", branch)],
    )?;
    Ok(())
}

/// Paths added, copied, modified or renamed in the index of `worktree`.
///
/// Works on an unborn branch, where everything in the index is new.
pub fn staged_paths<P: AsRef<Path>>(worktree: P) -> Result<Vec<String>> {
    let output = run_git(
        worktree,
        &[
            "-c",
            "core.quotePath=false",
            "diff",
            "--cached",
            "--name-only",
            "--diff-filter=ACMR",
        ],
    )?;
    Ok(output.lines().into_iter().map(String::from).collect())
}

/// Commit the index of `worktree` and return the new commit SHA.
pub fn commit<P: AsRef<Path>>(worktree: P, message: &str) -> Result<String> {
    commit_with(worktree.as_ref(), message, &[])
}

/// Like [`commit`] but succeeds with an empty index, giving an unborn branch
/// its first commit.
pub fn commit_allow_empty<P: AsRef<Path>>(worktree: P, message: &str) -> Result<String> {
    commit_with(worktree.as_ref(), message, &["--allow-empty"])
}

fn commit_with(worktree: &Path, message: &str, extra: &[&str]) -> Result<String> {
    let mut args = vec!["commit", "--quiet", "-m", message];
    args.extend_from_slice(extra);
    run_git(worktree, &args)?;
    let output = run_git(worktree, &["rev-parse", "HEAD"])?;
    Ok(output.stdout)
}
