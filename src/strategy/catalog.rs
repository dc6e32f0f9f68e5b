//! Built-in strategies.

use crate::config::{CustomStrategySpec, FlowEdge};

/// Name of the private branch in every catalog strategy.
pub const PRIVATE_BRANCH: &str = "private";

pub const CATALOG_NAMES: &[&str] = &["simple", "standard", "gitflow", "github-flow", "minimal"];

/// The catalog entry for `name`, expressed as a custom spec.
pub fn catalog_spec(name: &str) -> Option<CustomStrategySpec> {
    let (chain, worktrees): (&[&str], &[&str]) = match name {
        "simple" => (&["dev", "main"], &["main"]),
        "standard" => (
            &["dev", "test", "staging", "main", "live"],
            &["main", "dev"],
        ),
        "gitflow" => (&["develop", "release", "main"], &["main", "develop"]),
        "github-flow" => (&["main"], &["main"]),
        "minimal" => (&["main"], &[]),
        _ => return None,
    };

    let mut branches = vec![PRIVATE_BRANCH.to_string()];
    branches.extend(chain.iter().map(|s| s.to_string()));
    let flow = branches
        .windows(2)
        .map(|pair| FlowEdge {
            from: pair[0].clone(),
            to: pair[1].clone(),
        })
        .collect();

    Some(CustomStrategySpec {
        branches,
        worktrees: worktrees.iter().map(|s| s.to_string()).collect(),
        private_branch: Some(PRIVATE_BRANCH.to_string()),
        flow,
        roles: Default::default(),
        default_branch: Some(PRIVATE_BRANCH.to_string()),
    })
}
