//! Implementation of the `repokit status` command.
//!
//! Displays every branch of the strategy with its tip, worktree and how far
//! it lags behind the private branch, followed by any held locks.

use super::ManagedRepo;
use crate::error::Result;
use crate::locks;
use crate::orchestrator::RepositoryStatus;
use std::path::Path;

/// Execute the `repokit status` command.
pub fn cmd_status(cwd: &Path) -> Result<()> {
    let repo = ManagedRepo::open(cwd)?;
    let status = RepositoryStatus::collect(&repo.ctx, &repo.plan)?;
    let active_locks = locks::list_locks(&repo.ctx, repo.config.lock_stale_minutes)?;

    println!("Repository Status");
    println!("=================");
    println!();
    println!("Root:      {}", status.root.display());
    println!("Strategy:  {}", repo.marker.strategy);
    println!("Adopted:   {}", repo.marker.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let project_config = repo.ctx.project_config_path();
    if project_config.exists() {
        println!("Config:    {}", project_config.display());
    }
    println!();

    println!("Branches:");
    for branch in &status.branches {
        let tip = branch
            .tip
            .as_deref()
            .map(|t| t.get(..10).unwrap_or(t))
            .unwrap_or("(missing)");
        let lag = match branch.pending {
            Some(0) => "up to date".to_string(),
            Some(n) => format!("{} pending", n),
            None if branch.is_private => "private".to_string(),
            None => "never promoted".to_string(),
        };
        println!("  {:12} {:12} {:10}  {}", branch.name, branch.role, tip, lag);
        if let Some(worktree) = &branch.worktree {
            println!("  {:12} worktree: {}", "", worktree.display());
        }
    }

    if !active_locks.is_empty() {
        println!();
        println!("Locks:");
        for lock in &active_locks {
            println!("  - {}", lock);
        }
    }

    Ok(())
}
