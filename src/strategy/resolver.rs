//! Strategy validation and graph construction.

use super::catalog::{CATALOG_NAMES, catalog_spec};
use super::graph::BranchGraph;
use super::types::{BranchRole, BranchSpec, Edge};
use crate::config::{Config, CustomStrategySpec};
use crate::error::{RepokitError, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

const RESERVED_NAMES: &[&str] = &[
    "HEAD",
    "FETCH_HEAD",
    "ORIG_HEAD",
    "MERGE_HEAD",
    "CHERRY_PICK_HEAD",
    "origin",
    "@",
];

const FORBIDDEN_FRAGMENTS: &[&str] = &["..", "~", "^", ":", "?", "*", "[", "\\", "@{"];

/// Whether `name` cannot be used as a managed branch name.
pub fn is_reserved_branch_name(name: &str) -> bool {
    name.is_empty()
        || RESERVED_NAMES.contains(&name)
        || name.chars().any(char::is_whitespace)
        || FORBIDDEN_FRAGMENTS.iter().any(|f| name.contains(f))
        || name.starts_with('-')
        || name.starts_with('/')
        || name.ends_with('/')
        || name.ends_with(".lock")
}

/// Resolve a catalog strategy by name.
pub fn resolve_named(name: &str) -> Result<BranchGraph> {
    let spec = catalog_spec(name).ok_or_else(|| {
        RepokitError::InvalidStrategy(format!(
            "unknown strategy '{}' (available: {})",
            name,
            CATALOG_NAMES.join(", ")
        ))
    })?;
    build(name, &spec)
}

/// Resolve a custom strategy.
pub fn resolve_custom(spec: &CustomStrategySpec) -> Result<BranchGraph> {
    build("custom", spec)
}

/// The custom strategy when configured, the named one otherwise.
pub fn resolve_from_config(config: &Config) -> Result<BranchGraph> {
    match &config.custom_strategy {
        Some(custom) => resolve_custom(custom),
        None => resolve_named(config.strategy.trim()),
    }
}

fn build(strategy: &str, spec: &CustomStrategySpec) -> Result<BranchGraph> {
    let private = spec
        .private_branch
        .as_deref()
        .ok_or_else(|| invalid(format!("strategy '{}' names no private branch", strategy)))?;

    // Declared branches, then worktree-only names.
    let mut names: Vec<&str> = Vec::new();
    for name in &spec.branches {
        if names.contains(&name.as_str()) {
            return Err(invalid(format!("branch '{}' is declared twice", name)));
        }
        names.push(name);
    }
    let mut implicit: HashSet<&str> = HashSet::new();
    for name in &spec.worktrees {
        if !names.contains(&name.as_str()) {
            debug!(branch = %name, "adding worktree branch with role custom");
            names.push(name);
            implicit.insert(name);
        }
    }

    if let Some(bad) = names.iter().find(|n| is_reserved_branch_name(n)) {
        return Err(invalid(format!("'{}' is not a usable branch name", bad)));
    }
    if !names.contains(&private) {
        return Err(invalid(format!(
            "private branch '{}' is not declared in branches",
            private
        )));
    }

    for edge in &spec.flow {
        for end in [&edge.from, &edge.to] {
            if !names.contains(&end.as_str()) {
                return Err(invalid(format!(
                    "flow edge {} -> {} references undeclared branch '{}'",
                    edge.from, edge.to, end
                )));
            }
        }
        if edge.to == private {
            return Err(invalid(format!(
                "flow edge {} -> {} leads into private branch '{}'",
                edge.from, edge.to, private
            )));
        }
    }
    let flow: Vec<Edge> = spec
        .flow
        .iter()
        .map(|e| Edge::new(e.from.clone(), e.to.clone()))
        .collect();
    if let Some(cycle_member) = find_cycle(&names, &flow) {
        return Err(invalid(format!(
            "flow edges form a cycle through '{}'",
            cycle_member
        )));
    }

    let default_branch = spec.default_branch.as_deref().unwrap_or(private);
    if !names.contains(&default_branch) {
        return Err(invalid(format!(
            "default branch '{}' is not declared in branches",
            default_branch
        )));
    }

    let mut branches = Vec::with_capacity(names.len());
    for name in &names {
        let is_private = *name == private;
        let role = match spec.roles.get(*name) {
            Some(raw) => BranchRole::from_str(raw).ok_or_else(|| {
                invalid(format!("branch '{}' has unknown role '{}'", name, raw))
            })?,
            None if implicit.contains(name) => BranchRole::Custom,
            None => BranchRole::from_branch_name(name, is_private),
        };
        let wants_worktree = spec.worktrees.iter().any(|w| w == name);
        if wants_worktree && is_private {
            warn!(branch = %name, "private branch lives in the main working copy; ignoring worktree request");
        }
        branches.push(BranchSpec {
            name: name.to_string(),
            role,
            is_private,
            has_worktree: wants_worktree && !is_private,
            flow_targets: flow
                .iter()
                .filter(|e| e.from == *name)
                .map(|e| e.to.clone())
                .collect(),
        });
    }

    let repair = names
        .iter()
        .filter(|n| **n != private)
        .map(|n| Edge::new(*n, private))
        .collect();

    let graph = BranchGraph {
        strategy: strategy.to_string(),
        branches,
        private_branch: private.to_string(),
        default_branch: default_branch.to_string(),
        flow,
        repair,
    };

    for branch in graph.unreachable_public_branches() {
        warn!(branch, strategy, "public branch is not reachable from the private branch");
    }
    debug!(
        strategy,
        branches = graph.branches.len(),
        edges = graph.flow.len(),
        "resolved branch strategy"
    );
    Ok(graph)
}

/// Some branch on a forward cycle, if the edges contain one.
fn find_cycle<'a>(names: &[&'a str], flow: &'a [Edge]) -> Option<&'a str> {
    let mut in_degree: HashMap<&str, usize> = names.iter().map(|n| (*n, 0)).collect();
    for edge in flow {
        *in_degree.entry(edge.to.as_str()).or_insert(0) += 1;
    }

    let mut ready: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| in_degree.get(n) == Some(&0))
        .collect();
    let mut visited = 0;
    while let Some(node) = ready.pop() {
        visited += 1;
        for edge in flow.iter().filter(|e| e.from == node) {
            if let Some(degree) = in_degree.get_mut(edge.to.as_str()) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(edge.to.as_str());
                }
            }
        }
    }

    if visited == names.len() {
        None
    } else {
        names
            .iter()
            .copied()
            .find(|n| in_degree.get(n).is_some_and(|d| *d > 0))
    }
}

fn invalid(message: String) -> RepokitError {
    RepokitError::InvalidStrategy(message)
}
