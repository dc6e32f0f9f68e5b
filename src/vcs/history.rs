//! History queries: commit ranges, touched paths, ancestry.

use crate::error::{RepokitError, Result};
use crate::git::{GitInvocation, run_git, run_git_status};
use std::path::Path;

/// Metadata of a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    pub parents: Vec<String>,
    pub author_name: String,
    pub author_email: String,
    /// Author date in strict ISO 8601.
    pub author_date: String,
    /// Full commit message.
    pub message: String,
}

impl CommitInfo {
    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// A commit together with every path it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPaths {
    pub sha: String,
    pub summary: String,
    pub paths: Vec<String>,
}

/// Commits reachable from `tip` but not from `base`, oldest first.
///
/// With no `base` this is the full history of `tip`.
pub fn commit_range<P: AsRef<Path>>(repo: P, base: Option<&str>, tip: &str) -> Result<Vec<String>> {
    let range = match base {
        Some(base) => format!("{}..{}", base, tip),
        None => tip.to_string(),
    };
    let output = run_git(repo, &["rev-list", "--reverse", "--topo-order", &range])?;
    Ok(output.lines().into_iter().map(String::from).collect())
}

/// Read the metadata of commit `sha`.
pub fn commit_info<P: AsRef<Path>>(repo: P, sha: &str) -> Result<CommitInfo> {
    let output = run_git(
        repo,
        &[
            "show",
            "-s",
            "--format=%H%x00%P%x00%an%x00%ae%x00%aI%x00%B",
            sha,
        ],
    )?;

    let mut fields = output.stdout.splitn(6, '\0');
    let mut next = || fields.next().unwrap_or("").to_string();
    let sha = next();
    let parents = next();
    let author_name = next();
    let author_email = next();
    let author_date = next();
    let message = next().trim_end().to_string();

    if sha.is_empty() {
        return Err(RepokitError::GitError(format!(
            "could not read commit metadata for {}",
            output.stdout
        )));
    }

    Ok(CommitInfo {
        sha,
        parents: parents.split_whitespace().map(String::from).collect(),
        author_name,
        author_email,
        author_date,
        message,
    })
}

/// Paths touched by `sha` relative to each of its parents (or the empty tree for a root commit).
pub fn touched_paths<P: AsRef<Path>>(repo: P, sha: &str) -> Result<Vec<String>> {
    let output = run_git(
        repo,
        &[
            "-c",
            "core.quotePath=false",
            "diff-tree",
            "--root",
            "-r",
            "-m",
            "--no-commit-id",
            "--no-renames",
            "--name-only",
            sha,
        ],
    )?;

    let mut paths: Vec<String> = Vec::new();
    for line in output.lines() {
        if !paths.iter().any(|p| p == line) {
            paths.push(line.to_string());
        }
    }
    Ok(paths)
}

/// Every commit reachable from `tip` with the paths it touched, newest first.
pub fn history_paths<P: AsRef<Path>>(repo: P, tip: &str) -> Result<Vec<CommitPaths>> {
    let output = run_git(
        repo,
        &[
            "-c",
            "core.quotePath=false",
            "log",
            "--no-renames",
            "-m",
            "--name-only",
            "--format=%x01%H%x02%s",
            tip,
        ],
    )?;

    let mut commits: Vec<CommitPaths> = Vec::new();
    for line in output.stdout.lines() {
        if let Some(header) = line.strip_prefix('\u{1}') {
            let (sha, summary) = header.split_once('\u{2}').unwrap_or((header, ""));
            // `-m` repeats merge commits once per parent.
            if commits.last().map(|c| c.sha.as_str()) != Some(sha) {
                commits.push(CommitPaths {
                    sha: sha.to_string(),
                    summary: summary.to_string(),
                    paths: Vec::new(),
                });
            }
        } else if !line.is_empty()
            && let Some(current) = commits.last_mut()
            && !current.paths.iter().any(|p| p == line)
        {
            current.paths.push(line.to_string());
        }
    }
    Ok(commits)
}

/// Best common ancestor of two commits, if any.
pub fn merge_base<P: AsRef<Path>>(repo: P, a: &str, b: &str) -> Result<Option<String>> {
    let (code, output) = run_git_status(repo, &["merge-base", a, b], &GitInvocation::default())?;
    match code {
        0 => Ok(Some(output.stdout)),
        1 => Ok(None),
        _ => Err(RepokitError::GitError(format!(
            "git merge-base {} {} failed: {}",
            a, b, output.stderr
        ))),
    }
}

/// Returns true if `ancestor` is reachable from `descendant`.
pub fn is_ancestor<P: AsRef<Path>>(repo: P, ancestor: &str, descendant: &str) -> Result<bool> {
    let (code, output) = run_git_status(
        repo,
        &["merge-base", "--is-ancestor", ancestor, descendant],
        &GitInvocation::default(),
    )?;
    match code {
        0 => Ok(true),
        1 => Ok(false),
        _ => Err(RepokitError::GitError(format!(
            "git merge-base --is-ancestor failed: {}",
            output.stderr
        ))),
    }
}
