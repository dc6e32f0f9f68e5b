//! Read-only view of a managed repository.

use super::plan::AdoptionPlan;
use crate::context::RepoContext;
use crate::error::Result;
use crate::sanitize::promoted_ref;
use crate::state::StateMarker;
use crate::vcs;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct BranchStatus {
    pub name: String,
    pub role: String,
    pub is_private: bool,
    /// `None` when the branch does not exist yet.
    pub tip: Option<String>,
    pub worktree: Option<PathBuf>,
    /// Private commit this branch was last promoted from.
    pub promoted_from: Option<String>,
    /// Private commits not yet promoted into this branch.
    pub pending: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryStatus {
    pub root: PathBuf,
    pub marker: Option<StateMarker>,
    pub branches: Vec<BranchStatus>,
}

impl RepositoryStatus {
    /// Collect the status of every branch in `plan`'s graph.
    pub fn collect(ctx: &RepoContext, plan: &AdoptionPlan) -> Result<Self> {
        let root = &ctx.repo_root;
        let graph = &plan.graph;
        let worktrees = vcs::list_worktrees(root)?;
        let private_tip = vcs::branch_tip(root, &graph.private_branch)?;

        let mut branches = Vec::new();
        for spec in graph.creation_order() {
            let tip = vcs::branch_tip(root, &spec.name)?;
            let promoted_from = if spec.is_private {
                None
            } else {
                vcs::read_ref(root, &promoted_ref(&spec.name))?
            };
            let pending = match (&private_tip, &promoted_from) {
                (Some(private_tip), Some(from)) => {
                    Some(vcs::commit_range(root, Some(from.as_str()), private_tip)?.len())
                }
                _ => None,
            };
            branches.push(BranchStatus {
                name: spec.name.clone(),
                role: spec.role.as_str().to_string(),
                is_private: spec.is_private,
                tip,
                worktree: worktrees
                    .iter()
                    .find(|wt| wt.branch.as_deref() == Some(spec.name.as_str()))
                    .map(|wt| wt.path.clone()),
                promoted_from,
                pending,
            });
        }

        Ok(Self {
            root: root.clone(),
            marker: StateMarker::load(ctx)?,
            branches,
        })
    }
}
