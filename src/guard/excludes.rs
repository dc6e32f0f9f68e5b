//! Per-worktree exclude files for public working copies.
//!
//! The generated file lives in the worktree's own git directory and is wired
//! up through the worktree-scoped `core.excludesFile`, so private files can
//! stay on disk without ever being picked up by `git add`. It is never
//! version-controlled and is regenerated on every install.

use crate::error::Result;
use crate::fs::atomic_write_file;
use crate::git::{GitInvocation, git_dir, run_git, run_git_status};
use crate::patterns::{PatternKind, PatternMatcher, PatternScope, PatternSet};
use crate::strategy::BranchGraph;
use std::path::Path;
use tracing::{debug, info};

/// File name of the generated exclude file inside a worktree's git directory.
pub const EXCLUDE_FILE_NAME: &str = "repokit-exclude";

/// The exclude file body for `branch`.
///
/// Only glob patterns translate to ignore rules; regex and content patterns
/// are enforced by the guard alone.
pub fn exclude_file_contents(matcher: &PatternMatcher, branch: &str) -> String {
    let mut out = format!(
        "# Generated by repokit for branch '{}'. Do not edit.\n\
         # Regenerate with: repokit guard install\n",
        branch
    );
    let mut seen: Vec<&str> = Vec::new();
    for pattern in matcher.patterns() {
        let translatable = pattern.kind == PatternKind::Glob
            && pattern.scope != PatternScope::Content
            && pattern.set != PatternSet::ReservedName;
        if translatable && !seen.contains(&pattern.pattern.as_str()) {
            seen.push(&pattern.pattern);
            out.push_str(&pattern.pattern);
            out.push('\n');
        }
    }
    out
}

/// Install the exclude file for the public branch checked out in `worktree`.
///
/// Returns `false` without touching anything for the private branch.
pub fn install_excludes(
    worktree: &Path,
    branch: &str,
    graph: &BranchGraph,
    matcher: &PatternMatcher,
) -> Result<bool> {
    if !graph.is_public(branch) {
        debug!(branch, "private working copy gets no exclusions");
        return Ok(false);
    }

    let exclude_path = git_dir(worktree)?.join(EXCLUDE_FILE_NAME);
    let contents = exclude_file_contents(matcher, branch);
    let current = std::fs::read_to_string(&exclude_path).ok();
    if current.as_deref() != Some(contents.as_str()) {
        atomic_write_file(&exclude_path, &contents)?;
    }

    let (_, enabled) = run_git_status(
        worktree,
        &["config", "--get", "extensions.worktreeConfig"],
        &GitInvocation::default(),
    )?;
    if enabled.stdout != "true" {
        run_git(worktree, &["config", "extensions.worktreeConfig", "true"])?;
    }

    let exclude_value = exclude_path.to_string_lossy().to_string();
    let (_, configured) = run_git_status(
        worktree,
        &["config", "--worktree", "--get", "core.excludesFile"],
        &GitInvocation::default(),
    )?;
    if configured.stdout != exclude_value {
        run_git(
            worktree,
            &["config", "--worktree", "core.excludesFile", &exclude_value],
        )?;
    }

    info!(branch, path = %exclude_path.display(), "installed guard excludes");
    Ok(true)
}
