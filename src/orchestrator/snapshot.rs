//! Repository snapshots and rollback.
//!
//! A snapshot records the refs, worktrees, HEAD and repokit-owned files of a
//! repository before anything destructive happens. While the operation runs
//! it also collects the paths it creates. On failure `rollback` puts every
//! recorded item back and reports what it could not restore.

use crate::context::RepoContext;
use crate::error::{RepokitError, Result};
use crate::fs::{atomic_write_file, remove_if_empty};
use crate::git::run_git;
use crate::vcs::{self, RefEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Ref namespaces captured and restored.
const SNAPSHOT_REF_PREFIXES: &[&str] = &["refs/heads", "refs/repokit"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub taken_at: DateTime<Utc>,

    pub root: PathBuf,

    /// The `.git` directory was created by this operation.
    pub fresh_repository: bool,

    /// Branch HEAD of the main working copy pointed at (possibly unborn).
    pub head: Option<String>,

    pub refs: Vec<RefEntry>,

    pub worktrees: Vec<PathBuf>,

    /// Raw state marker contents.
    pub marker: Option<String>,

    /// Raw `info/exclude` contents.
    pub info_exclude: Option<String>,

    /// Paths created by the operation, outermost first.
    #[serde(default)]
    pub created_paths: Vec<PathBuf>,

    /// Paths staged in the main working copy by the operation.
    #[serde(default)]
    pub staged_paths: Vec<String>,
}

pub(crate) fn info_exclude_path(ctx: &RepoContext) -> PathBuf {
    ctx.git_common_dir.join("info").join("exclude")
}

impl RepositorySnapshot {
    /// Capture the current state of the repository at `ctx`.
    pub fn capture(ctx: &RepoContext, fresh_repository: bool) -> Result<Self> {
        let root = &ctx.repo_root;
        Ok(Self {
            taken_at: Utc::now(),
            root: root.clone(),
            fresh_repository,
            head: vcs::head_branch(root)?,
            refs: vcs::list_refs(root, SNAPSHOT_REF_PREFIXES)?,
            worktrees: vcs::list_worktrees(root)?
                .into_iter()
                .map(|wt| wt.path)
                .collect(),
            marker: std::fs::read_to_string(ctx.marker_path()).ok(),
            info_exclude: std::fs::read_to_string(info_exclude_path(ctx)).ok(),
            created_paths: Vec::new(),
            staged_paths: Vec::new(),
        })
    }

    /// Write the snapshot to `backups/<timestamp>.json`.
    pub fn persist(&self, ctx: &RepoContext) -> Result<PathBuf> {
        let path = ctx
            .backups_dir()
            .join(format!("{}.json", self.taken_at.format("%Y%m%dT%H%M%S%.3fZ")));
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            RepokitError::UserError(format!("failed to serialize snapshot: {}", e))
        })?;
        atomic_write_file(&path, &json)?;
        debug!(path = %path.display(), "snapshot persisted");
        Ok(path)
    }

    /// Load a persisted snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RepokitError::UserError(format!(
                "failed to read snapshot '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            RepokitError::UserError(format!(
                "failed to parse snapshot '{}': {}",
                path.display(),
                e
            ))
        })
    }

    pub fn record_created(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        for path in paths {
            if !self.created_paths.contains(&path) {
                self.created_paths.push(path);
            }
        }
    }

    pub fn record_staged(&mut self, paths: &[String]) {
        self.staged_paths.extend_from_slice(paths);
    }

    fn had_worktree(&self, path: &Path) -> bool {
        self.worktrees
            .iter()
            .any(|wt| vcs::paths_equivalent(wt, path))
    }

    /// Undo everything recorded since the snapshot.
    ///
    /// Each step runs even if an earlier one failed; the returned list
    /// describes everything that could not be restored.
    pub fn rollback(&self, ctx: &RepoContext) -> Vec<String> {
        let mut problems = Vec::new();
        let root = &self.root;
        info!(root = %root.display(), "rolling back to snapshot");

        match vcs::list_worktrees(root) {
            Ok(current) => {
                for wt in current.iter().filter(|wt| !self.had_worktree(&wt.path)) {
                    if let Err(e) = vcs::remove_worktree(root, &wt.path, true) {
                        problems.push(format!("could not remove worktree {}: {}", wt.path.display(), e));
                    }
                }
            }
            Err(e) => problems.push(format!("could not list worktrees: {}", e)),
        }

        if !self.fresh_repository {
            self.restore_head(&mut problems);
            self.restore_refs(&mut problems);
            if let Err(e) = vcs::unstage_paths(root, &self.staged_paths) {
                problems.push(format!("could not reset the index: {}", e));
            }
            restore_file(&ctx.marker_path(), self.marker.as_deref(), &mut problems);
            restore_file(
                &info_exclude_path(ctx),
                self.info_exclude.as_deref(),
                &mut problems,
            );
        }

        for path in self.created_paths.iter().rev() {
            match remove_if_empty(path) {
                Ok(true) => {}
                Ok(false) => warn!(path = %path.display(), "left non-empty directory in place"),
                Err(e) => problems.push(e.to_string()),
            }
        }

        if self.fresh_repository {
            let git_dir = root.join(".git");
            if let Err(e) = std::fs::remove_dir_all(&git_dir) {
                problems.push(format!("could not remove {}: {}", git_dir.display(), e));
            }
            // The root itself may have been created for this repository.
            if let Some(first) = self.created_paths.first()
                && first == root
                && let Err(e) = remove_if_empty(root)
            {
                problems.push(e.to_string());
            }
        }

        problems
    }

    fn restore_head(&self, problems: &mut Vec<String>) {
        let Some(head) = &self.head else {
            return;
        };
        match vcs::head_branch(&self.root) {
            Ok(current) if current.as_deref() == Some(head.as_str()) => {}
            Ok(_) => {
                if let Err(e) = vcs::set_head(&self.root, head) {
                    problems.push(format!("could not restore HEAD to {}: {}", head, e));
                }
            }
            Err(e) => problems.push(format!("could not read HEAD: {}", e)),
        }
    }

    fn restore_refs(&self, problems: &mut Vec<String>) {
        let current = match vcs::list_refs(&self.root, SNAPSHOT_REF_PREFIXES) {
            Ok(refs) => refs,
            Err(e) => {
                problems.push(format!("could not list refs: {}", e));
                return;
            }
        };

        for entry in &current {
            match self.refs.iter().find(|r| r.name == entry.name) {
                None => {
                    debug!(refname = %entry.name, "deleting ref created by the operation");
                    if let Err(e) = vcs::delete_ref(&self.root, &entry.name) {
                        problems.push(format!("could not delete {}: {}", entry.name, e));
                    }
                }
                Some(old) if old.sha != entry.sha => {
                    if let Err(e) =
                        vcs::update_ref(&self.root, &old.name, &old.sha, None, "rollback")
                    {
                        problems.push(format!("could not restore {}: {}", old.name, e));
                    }
                }
                Some(_) => {}
            }
        }

        for old in &self.refs {
            if !current.iter().any(|c| c.name == old.name)
                && let Err(e) = vcs::update_ref(&self.root, &old.name, &old.sha, Some(""), "rollback")
            {
                problems.push(format!("could not recreate {}: {}", old.name, e));
            }
        }

        // Keep the worktree bookkeeping in step with removed directories.
        if let Err(e) = run_git(&self.root, &["worktree", "prune"]) {
            problems.push(format!("could not prune worktrees: {}", e));
        }
    }
}

fn restore_file(path: &Path, contents: Option<&str>, problems: &mut Vec<String>) {
    let current = std::fs::read_to_string(path).ok();
    if current.as_deref() == contents {
        return;
    }
    let outcome = match contents {
        Some(contents) => atomic_write_file(path, contents),
        None => std::fs::remove_file(path).map_err(|e| {
            RepokitError::UserError(format!("failed to remove '{}': {}", path.display(), e))
        }),
    };
    if let Err(e) = outcome {
        problems.push(format!("could not restore {}: {}", path.display(), e));
    }
}
