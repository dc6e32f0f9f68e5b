//! Persisted state marker.
//!
//! `<git-common-dir>/repokit/state.yaml` records what `adopt` materialized so
//! a later run can tell a managed repository from a half-adopted one and
//! refuse to reshape a repository under a different strategy.

use crate::config::PrivateSetSelector;
use crate::context::RepoContext;
use crate::error::{RepokitError, Result};
use crate::fs::atomic_write_file;
use crate::strategy::BranchGraph;
use crate::vcs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lifecycle phase of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Materialization started but has not finished.
    Adopting,
    /// Every branch, worktree and guard is in place.
    Managed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Adopting => "adopting",
            Phase::Managed => "managed",
        }
    }
}

/// Contents of `state.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMarker {
    pub strategy: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_profile: Option<String>,

    #[serde(default)]
    pub directory_groups: Vec<String>,

    pub private_set: PrivateSetSelector,

    /// Branches of the graph, in creation order.
    pub branches: Vec<String>,

    pub private_branch: String,

    pub phase: Phase,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StateMarker {
    /// New marker in the `adopting` phase for `graph`.
    pub fn adopting(
        graph: &BranchGraph,
        directory_profile: Option<&str>,
        directory_groups: &[String],
        private_set: PrivateSetSelector,
    ) -> Self {
        let now = Utc::now();
        Self {
            strategy: graph.strategy.clone(),
            directory_profile: directory_profile.map(String::from),
            directory_groups: directory_groups.to_vec(),
            private_set,
            branches: graph
                .creation_order()
                .iter()
                .map(|b| b.name.clone())
                .collect(),
            private_branch: graph.private_branch.clone(),
            phase: Phase::Adopting,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `phase`, bumping `updated_at`.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self.updated_at = Utc::now();
        self
    }

    pub fn is_managed(&self) -> bool {
        self.phase == Phase::Managed
    }

    /// Read the marker. `Ok(None)` when the repository was never adopted.
    ///
    /// An unreadable or unparsable marker is `CorruptedState`.
    pub fn load(ctx: &RepoContext) -> Result<Option<Self>> {
        Self::load_from(&ctx.marker_path())
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            RepokitError::CorruptedState(format!(
                "cannot read marker '{}': {}",
                path.display(),
                e
            ))
        })?;
        let marker = serde_yaml::from_str(&content).map_err(|e| {
            RepokitError::CorruptedState(format!(
                "cannot parse marker '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Some(marker))
    }

    pub fn save(&self, ctx: &RepoContext) -> Result<()> {
        let yaml = serde_yaml::to_string(self).map_err(|e| {
            RepokitError::UserError(format!("failed to serialize state marker: {}", e))
        })?;
        atomic_write_file(ctx.marker_path(), &yaml)
    }

    /// Check that adopting `graph` into this repository is consistent with
    /// what the marker records.
    ///
    /// Only a `managed` marker constrains anything: its strategy must match
    /// and every branch it lists must still exist. An `adopting` marker is
    /// left over from an interrupted run and is simply resumed.
    pub fn check_compatible(&self, graph: &BranchGraph, repo: &Path) -> Result<()> {
        if !self.is_managed() {
            return Ok(());
        }

        if self.strategy != graph.strategy {
            return Err(RepokitError::CorruptedState(format!(
                "repository is managed with strategy '{}', not '{}'",
                self.strategy, graph.strategy
            )));
        }

        let mut missing = Vec::new();
        for branch in &self.branches {
            if !vcs::branch_exists(repo, branch)? {
                missing.push(branch.clone());
            }
        }
        if !missing.is_empty() {
            return Err(RepokitError::CorruptedState(format!(
                "managed branches are missing: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }
}
