//! Whole-history verification of a branch.

use super::classify::PrivateContentGuard;
use crate::error::{RepokitError, Result, UnsafeCommit};
use crate::vcs::{branch_tip, history_paths};
use std::path::Path;
use tracing::info;

impl PrivateContentGuard<'_> {
    /// Every commit reachable from `branch` that touched a sensitive path,
    /// newest first. A missing branch has no history.
    pub fn verify_history(&self, repo: &Path, branch: &str) -> Result<Vec<UnsafeCommit>> {
        let Some(tip) = branch_tip(repo, branch)? else {
            return Ok(Vec::new());
        };
        let commits = history_paths(repo, &tip)?;
        let unsafe_commits = self.unsafe_commits(branch, &commits);
        info!(
            branch,
            commits = commits.len(),
            offending = unsafe_commits.len(),
            "verified branch history"
        );
        Ok(unsafe_commits)
    }

    /// `verify_history` as a pass/fail check.
    ///
    /// The error lists each offending path with the commit that touched it.
    pub fn ensure_clean_history(&self, repo: &Path, branch: &str) -> Result<()> {
        let offending = self.verify_history(repo, branch)?;
        if offending.is_empty() {
            return Ok(());
        }
        let paths = offending
            .iter()
            .flat_map(|c| {
                c.paths
                    .iter()
                    .map(move |p| format!("{} (commit {})", p, c.sha.get(..10).unwrap_or(&c.sha)))
            })
            .collect();
        Err(RepokitError::PrivateContentDetected {
            branch: branch.to_string(),
            paths,
        })
    }
}
