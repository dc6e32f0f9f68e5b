//! Implementation of the `repokit adopt` command.
//!
//! Thin wrapper over [`orchestrator::adopt`]: merges configuration with the
//! command-line selection, optionally prints the plan only, and reports what
//! the orchestrator did.

use crate::cli::AdoptArgs;
use crate::config::Config;
use crate::error::Result;
use crate::orchestrator::{self, AdoptRequest, AdoptionPlan, AdoptionReport};
use crate::templates::BuiltinTemplates;
use std::path::Path;

/// Execute the `repokit adopt` command.
///
/// This command is **idempotent**: running it on a managed repository with
/// the same selection verifies the repository and changes nothing.
pub fn cmd_adopt(cwd: &Path, args: AdoptArgs) -> Result<()> {
    let root = match &args.path {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => cwd.join(path),
        None => cwd.to_path_buf(),
    };

    let config = Config::load_layered(&root, &args.selection.to_overrides()?)?;

    if args.dry_run {
        let plan = AdoptionPlan::build(&root, &config)?;
        print_plan(&plan);
        return Ok(());
    }

    let templates = BuiltinTemplates;
    let mut request = AdoptRequest::new(&root, config).with_force(args.force);
    if !args.no_templates {
        request = request.with_renderer(&templates);
    }
    request.project_name = args.name;
    request.description = args.description;

    let report = orchestrator::adopt(&request)?;
    print_report(&report);
    Ok(())
}

fn print_plan(plan: &AdoptionPlan) {
    let graph = &plan.graph;
    println!("Adoption plan for {} (dry run)", plan.root.display());
    println!();
    println!("Strategy:  {}", graph.strategy);
    println!("Branches:");
    for spec in graph.creation_order() {
        let base = graph
            .base_of(&spec.name)
            .map(|b| format!(" (from {})", b))
            .unwrap_or_default();
        println!("  {:12} {}{}", spec.name, spec.role.as_str(), base);
    }
    println!("Worktrees:");
    for spec in graph.worktree_branches() {
        println!("  {:12} {}", spec.name, plan.worktree_path(&spec.name).display());
    }
    println!("Directories:");
    for dir in plan.private_tree_directories() {
        let private = if plan.private_directories.contains(&dir) {
            " [private]"
        } else {
            ""
        };
        println!("  {}{}", dir, private);
    }
}

fn print_report(report: &AdoptionReport) {
    println!("Adopted {}", report.root.display());
    println!();
    println!("  Strategy:       {}", report.strategy);
    println!("  Private branch: {}", report.private_branch);
    if let Some(commit) = &report.private_commit {
        println!("  Private commit: {}", commit);
    }
    if !report.created_branches.is_empty() {
        println!("  Created:        {}", report.created_branches.join(", "));
    }
    if !report.existing_branches.is_empty() {
        println!("  Verified:       {}", report.existing_branches.join(", "));
    }
    for (branch, path) in &report.worktrees {
        println!("  Worktree:       {} -> {}", branch, path.display());
    }
    println!("  Snapshot:       {}", report.snapshot.display());
}
