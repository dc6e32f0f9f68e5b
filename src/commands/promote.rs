//! Implementation of the `repokit promote` and `repokit cascade` commands.
//!
//! Both run under the repository lock plus the branch lock of every branch
//! whose ref may move. The sanitizer only moves refs; working copies that
//! have a moved branch checked out are brought along afterwards.

use super::ManagedRepo;
use crate::cli::{CascadeArgs, PromoteArgs};
use crate::error::{RepokitError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::git::has_uncommitted_changes;
use crate::guard::PrivateContentGuard;
use crate::locks::{self, LockGuard};
use crate::sanitize::{HistorySanitizer, MergeRules, Redactor};
use crate::vcs;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Execute the `repokit promote` command.
pub fn cmd_promote(cwd: &Path, args: PromoteArgs) -> Result<()> {
    let repo = ManagedRepo::open(cwd)?;
    let root = repo.ctx.repo_root.as_path();

    let _repo_lock = locks::acquire_repository_lock(&repo.ctx, "promote")?;
    let _branch_lock = locks::acquire_branch_lock(&repo.ctx, &args.target, "promote")?;
    let checkouts = CheckedOut::find(root, &[args.target.as_str()])?;

    let sanitizer = build_sanitizer(&repo)?;
    let (op, outcome) = sanitizer.merge(&args.source, &args.target, args.mode.mode())?;
    sync_checkouts(root, &checkouts)?;

    let event = Event::new(EventAction::Promote)
        .with_branch(&args.target)
        .with_details(json!({
            "source": op.source_branch,
            "target": op.target_branch,
            "mode": op.mode.as_str(),
            "commits": op.commits.len(),
            "created": outcome.created_commits(),
            "outcome": outcome.describe(),
        }));
    append_event(&repo.ctx, &event)?;

    println!(
        "{} -> {} ({}): {}",
        op.source_branch,
        op.target_branch,
        op.mode.as_str(),
        outcome.describe()
    );
    Ok(())
}

/// Execute the `repokit cascade` command.
///
/// Steps before a failing one stay applied; they are printed and recorded
/// before the failure is returned.
pub fn cmd_cascade(cwd: &Path, args: CascadeArgs) -> Result<()> {
    let repo = ManagedRepo::open(cwd)?;
    let root = repo.ctx.repo_root.as_path();
    let path = repo.plan.graph.promotion_path(&args.target)?;

    let _repo_lock = locks::acquire_repository_lock(&repo.ctx, "cascade")?;
    let targets: Vec<&str> = path.iter().map(|edge| edge.to.as_str()).collect();
    let _branch_locks = targets
        .iter()
        .map(|branch| locks::acquire_branch_lock(&repo.ctx, branch, "cascade"))
        .collect::<Result<Vec<LockGuard>>>()?;
    let checkouts = CheckedOut::find(root, &targets)?;

    let sanitizer = build_sanitizer(&repo)?;
    let report = sanitizer.cascade(&args.target, args.mode.mode())?;
    sync_checkouts(root, &checkouts)?;

    let steps: Vec<_> = report
        .applied
        .iter()
        .map(|step| {
            json!({
                "source": step.op.source_branch,
                "target": step.op.target_branch,
                "mode": step.op.mode.as_str(),
                "outcome": step.outcome.describe(),
            })
        })
        .collect();
    let event = Event::new(EventAction::Cascade)
        .with_branch(&args.target)
        .with_details(json!({
            "path": report.path.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            "applied": steps,
            "failed": report.failed.as_ref().map(|f| json!({
                "step": f.edge.to_string(),
                "error": f.error.to_string(),
            })),
        }));
    append_event(&repo.ctx, &event)?;

    for step in &report.applied {
        println!(
            "  {} -> {} ({}): {}",
            step.op.source_branch,
            step.op.target_branch,
            step.op.mode.as_str(),
            step.outcome.describe()
        );
    }
    if let Some(failed) = &report.failed {
        println!("  {}: stopped", failed.edge);
    }

    let complete = report.is_complete();
    report.into_result()?;
    if complete {
        println!("Cascade to '{}' complete.", args.target);
    }
    Ok(())
}

fn build_sanitizer(repo: &ManagedRepo) -> Result<HistorySanitizer<'_>> {
    let graph = &repo.plan.graph;
    let guard = PrivateContentGuard::new(graph, &repo.plan.matcher, &repo.config.sensitive);
    Ok(HistorySanitizer::new(
        &repo.ctx.repo_root,
        guard,
        MergeRules::for_graph(&repo.config.merge_rules, graph)?,
        Redactor::from_config(&repo.config)?,
    ))
}

/// A working copy with a branch checked out whose ref may move.
struct CheckedOut {
    branch: String,
    path: PathBuf,
    tip: Option<String>,
}

impl CheckedOut {
    /// Working copies of `branches`. Each must be free of uncommitted
    /// tracked changes, or its files could not follow the ref.
    fn find(root: &Path, branches: &[&str]) -> Result<Vec<Self>> {
        let mut found = Vec::new();
        for wt in vcs::list_worktrees(root)? {
            let Some(branch) = wt.branch else {
                continue;
            };
            if !branches.contains(&branch.as_str()) {
                continue;
            }
            if has_uncommitted_changes(&wt.path)? {
                return Err(RepokitError::UserError(format!(
                    "working copy of '{}' at {} has uncommitted changes; commit or stash them first",
                    branch,
                    wt.path.display()
                )));
            }
            let tip = vcs::branch_tip(root, &branch)?;
            found.push(Self {
                branch,
                path: wt.path,
                tip,
            });
        }
        Ok(found)
    }
}

/// Update the files of every working copy whose branch moved.
fn sync_checkouts(root: &Path, checkouts: &[CheckedOut]) -> Result<()> {
    for checkout in checkouts {
        let (Some(before), Some(after)) = (&checkout.tip, vcs::branch_tip(root, &checkout.branch)?)
        else {
            continue;
        };
        if *before == after {
            continue;
        }
        debug!(branch = %checkout.branch, path = %checkout.path.display(), "updating working copy");
        vcs::sync_checkout(&checkout.path, before, &after)?;
    }
    Ok(())
}
