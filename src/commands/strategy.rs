//! Implementation of the `repokit strategy` subcommands.

use crate::cli::StrategyShowArgs;
use crate::config::{Config, ConfigOverrides};
use crate::error::Result;
use crate::strategy::{BranchGraph, CATALOG_NAMES, resolve_from_config, resolve_named};
use std::path::Path;

/// List the catalog strategies with their forward chains.
pub fn cmd_strategy_list() -> Result<()> {
    for name in CATALOG_NAMES {
        let graph = resolve_named(name)?;
        let chain: Vec<&str> = graph
            .creation_order()
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        println!("  {:12} {}", name, chain.join(" -> "));
    }
    Ok(())
}

/// Show one strategy's branch graph: the named catalog entry, or the
/// strategy configured for the project in `cwd`.
pub fn cmd_strategy_show(cwd: &Path, args: StrategyShowArgs) -> Result<()> {
    let graph = match &args.name {
        Some(name) => resolve_named(name)?,
        None => resolve_from_config(&Config::load_layered(cwd, &ConfigOverrides::default())?)?,
    };
    print_graph(&graph);
    Ok(())
}

fn print_graph(graph: &BranchGraph) {
    println!("Strategy: {}", graph.strategy);
    println!("Default:  {}", graph.default_branch);
    println!();
    println!("Branches:");
    for spec in graph.creation_order() {
        let mut flags = Vec::new();
        if spec.is_private {
            flags.push("private");
        }
        if spec.has_worktree {
            flags.push("worktree");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        println!("  {:12} {}{}", spec.name, spec.role, flags);
    }
    println!();
    println!("Forward edges:");
    for edge in &graph.flow {
        println!("  {}", edge);
    }
    println!();
    println!("Repair edges:");
    for spec in graph.public_branches() {
        if let Some(edge) = graph.repair_edge(&spec.name) {
            println!("  {}", edge);
        }
    }
    let unreachable = graph.unreachable_public_branches();
    if !unreachable.is_empty() {
        println!();
        println!("Unreachable from {}: {}", graph.private_branch, unreachable.join(", "));
    }
}
