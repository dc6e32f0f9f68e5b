//! Implementation of the `repokit guard` subcommands.

use super::ManagedRepo;
use crate::cli::VerifyArgs;
use crate::error::{RepokitError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::guard::{PrivateContentGuard, install_excludes};
use crate::vcs;
use serde_json::json;
use std::path::Path;

/// Regenerate the exclude file of every public working copy.
///
/// Idempotent: working copies whose exclude file is current are left alone.
pub fn cmd_guard_install(cwd: &Path) -> Result<()> {
    let repo = ManagedRepo::open(cwd)?;
    let graph = &repo.plan.graph;

    let mut installed = Vec::new();
    for wt in vcs::list_worktrees(&repo.ctx.repo_root)? {
        let Some(branch) = wt.branch.as_deref() else {
            continue;
        };
        if install_excludes(&wt.path, branch, graph, &repo.plan.matcher)? {
            println!("  {:12} {}", branch, wt.path.display());
            installed.push(branch.to_string());
        }
    }

    if installed.is_empty() {
        println!("No public working copies found.");
        return Ok(());
    }

    let event = Event::new(EventAction::GuardInstall).with_details(json!({
        "branches": installed,
    }));
    append_event(&repo.ctx, &event)?;
    println!("Guard excludes installed in {} working copies.", installed.len());
    Ok(())
}

/// Verify the full history of one public branch, or every public branch.
///
/// All branches are checked before failing, so one run lists every problem.
pub fn cmd_guard_verify(cwd: &Path, args: VerifyArgs) -> Result<()> {
    let repo = ManagedRepo::open(cwd)?;
    let graph = &repo.plan.graph;
    let guard = PrivateContentGuard::new(graph, &repo.plan.matcher, &repo.config.sensitive);
    let root = &repo.ctx.repo_root;

    let branches: Vec<String> = match args.branch {
        Some(branch) => {
            if graph.is_private(&branch) {
                return Err(RepokitError::UserError(format!(
                    "'{}' is the private branch; only public branches are verified",
                    branch
                )));
            }
            vec![branch]
        }
        None => graph.public_branches().map(|b| b.name.clone()).collect(),
    };

    let mut first_failure = None;
    for branch in &branches {
        if !vcs::branch_exists(root, branch)? {
            println!("  {:12} missing", branch);
            continue;
        }
        match guard.ensure_clean_history(root, branch) {
            Ok(()) => println!("  {:12} clean", branch),
            Err(e) => {
                println!("  {:12} UNSAFE", branch);
                first_failure.get_or_insert(e);
            }
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
