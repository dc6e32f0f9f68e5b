//! Repository context resolution for repokit.
//!
//! Finds the main working copy and the shared git directory from any working
//! directory (the main checkout or any linked worktree) and derives the paths
//! of repokit's own state, which lives under `<git-common-dir>/repokit/` and is
//! therefore never version-controlled.

use crate::error::{RepokitError, Result};
use crate::git;
use crate::vcs;
use std::path::{Path, PathBuf};

/// Directory under the git common dir holding repokit state.
pub const STATE_DIR_NAME: &str = "repokit";

/// Project configuration file name at the repository root.
pub const PROJECT_CONFIG_FILE: &str = ".repokit.yml";

/// Resolved paths for a repokit-managed repository. All paths are absolute.
#[derive(Debug, Clone)]
pub struct RepoContext {
    /// The main working copy (where the private branch is checked out).
    pub repo_root: PathBuf,

    /// The git directory shared by all worktrees.
    pub git_common_dir: PathBuf,

    /// `<git-common-dir>/repokit/`
    pub state_dir: PathBuf,

    /// `<git-common-dir>/repokit/locks/`
    pub locks_dir: PathBuf,
}

impl RepoContext {
    /// Resolve the context from a specific directory inside the repository.
    pub fn resolve_from<P: AsRef<Path>>(cwd: P) -> Result<Self> {
        let cwd = cwd.as_ref();
        let toplevel = git::get_repo_root(cwd)?;

        // `git worktree list` always reports the main working copy first.
        let repo_root = vcs::list_worktrees(&toplevel)?
            .into_iter()
            .next()
            .map(|wt| wt.path)
            .filter(|p| p.exists())
            .unwrap_or(toplevel);

        Self::for_root(repo_root)
    }

    /// Build the context for a known main working copy.
    pub fn for_root<P: AsRef<Path>>(repo_root: P) -> Result<Self> {
        let repo_root = repo_root.as_ref().to_path_buf();
        let git_common_dir = git::git_common_dir(&repo_root)?;
        let state_dir = git_common_dir.join(STATE_DIR_NAME);
        let locks_dir = state_dir.join("locks");

        Ok(Self {
            repo_root,
            git_common_dir,
            state_dir,
            locks_dir,
        })
    }

    /// Path of the state marker file.
    pub fn marker_path(&self) -> PathBuf {
        self.state_dir.join("state.yaml")
    }

    /// Path of the audit event log.
    pub fn events_file(&self) -> PathBuf {
        self.state_dir.join("events.ndjson")
    }

    /// Directory holding snapshot backups.
    pub fn backups_dir(&self) -> PathBuf {
        self.state_dir.join("backups")
    }

    /// Path of the project configuration file.
    pub fn project_config_path(&self) -> PathBuf {
        self.repo_root.join(PROJECT_CONFIG_FILE)
    }

    /// Path of the repository operation lock.
    pub fn repository_lock_path(&self) -> PathBuf {
        self.locks_dir.join("repository.lock")
    }

    /// Path of a per-branch working-copy lock.
    ///
    /// Slashes in branch names are flattened so every lock is a direct child of
    /// the locks directory.
    pub fn branch_lock_path(&self, branch: &str) -> PathBuf {
        self.locks_dir
            .join(format!("branch-{}.lock", branch.replace('/', "__")))
    }
}
