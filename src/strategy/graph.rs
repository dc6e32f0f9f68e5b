//! The resolved branch graph and traversals over it.

use super::types::{BranchSpec, Edge};
use crate::error::{RepokitError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// A validated branch strategy.
///
/// `branches` keeps declaration order. `flow` holds forward (promotion) edges
/// and `repair` holds the public -> private edges, which are never used for
/// promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchGraph {
    /// Catalog name, or `custom`.
    pub strategy: String,
    pub branches: Vec<BranchSpec>,
    pub private_branch: String,
    pub default_branch: String,
    pub flow: Vec<Edge>,
    pub repair: Vec<Edge>,
}

impl BranchGraph {
    pub fn get(&self, name: &str) -> Option<&BranchSpec> {
        self.branches.iter().find(|b| b.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_private(&self, name: &str) -> bool {
        name == self.private_branch
    }

    /// Every branch other than the private one is public, including branches
    /// the graph does not declare.
    pub fn is_public(&self, name: &str) -> bool {
        !self.is_private(name)
    }

    pub fn public_branches(&self) -> impl Iterator<Item = &BranchSpec> {
        self.branches.iter().filter(|b| !b.is_private)
    }

    pub fn worktree_branches(&self) -> impl Iterator<Item = &BranchSpec> {
        self.branches.iter().filter(|b| b.has_worktree)
    }

    /// Forward predecessors of `name`, in edge declaration order.
    pub fn predecessors(&self, name: &str) -> Vec<&str> {
        self.flow
            .iter()
            .filter(|e| e.to == name)
            .map(|e| e.from.as_str())
            .collect()
    }

    /// The repair edge leading from `name` back to the private branch.
    pub fn repair_edge(&self, name: &str) -> Option<&Edge> {
        self.repair.iter().find(|e| e.from == name)
    }

    /// The branch `name` is created from.
    ///
    /// The first declared forward predecessor; with none, the default branch
    /// when that branch is itself a root of the forward graph, otherwise the
    /// private branch. `None` for the private branch.
    pub fn base_of(&self, name: &str) -> Option<&str> {
        if self.is_private(name) {
            return None;
        }
        if let Some(first) = self.predecessors(name).into_iter().next() {
            return Some(first);
        }
        let default = self.default_branch.as_str();
        if default != name && self.predecessors(default).is_empty() {
            Some(default)
        } else {
            Some(self.private_branch.as_str())
        }
    }

    /// Branches in the order they must be created: every branch after its
    /// base and its forward predecessors, declaration order among peers.
    pub fn creation_order(&self) -> Vec<&BranchSpec> {
        let mut placed: HashSet<&str> = HashSet::new();
        let mut order: Vec<&BranchSpec> = Vec::with_capacity(self.branches.len());

        while order.len() < self.branches.len() {
            let next = self.branches.iter().find(|b| {
                !placed.contains(b.name.as_str())
                    && self
                        .predecessors(&b.name)
                        .into_iter()
                        .chain(self.base_of(&b.name))
                        .all(|dep| placed.contains(dep))
            });
            match next {
                Some(branch) => {
                    placed.insert(branch.name.as_str());
                    order.push(branch);
                }
                None => {
                    // Unreachable for validated graphs; keep declaration order.
                    order.extend(
                        self.branches
                            .iter()
                            .filter(|b| !placed.contains(b.name.as_str())),
                    );
                    break;
                }
            }
        }
        order
    }

    /// Forward edges from the private branch to `target`, in promotion order.
    ///
    /// Breadth-first over forward edges in declaration order, so the shortest
    /// path wins and ties go to the first declared edge.
    pub fn promotion_path(&self, target: &str) -> Result<Vec<Edge>> {
        if !self.contains(target) {
            return Err(RepokitError::UserError(format!(
                "branch '{}' is not part of the '{}' strategy (branches: {})",
                target,
                self.strategy,
                self.branches
                    .iter()
                    .map(|b| b.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        if self.is_private(target) {
            return Ok(Vec::new());
        }

        let mut came_from: Vec<(&str, &Edge)> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::from([self.private_branch.as_str()]);
        let mut queue: VecDeque<&str> = VecDeque::from([self.private_branch.as_str()]);

        while let Some(current) = queue.pop_front() {
            if current == target {
                break;
            }
            for edge in self.flow.iter().filter(|e| e.from == current) {
                if seen.insert(edge.to.as_str()) {
                    came_from.push((edge.to.as_str(), edge));
                    queue.push_back(edge.to.as_str());
                }
            }
        }

        let mut path = Vec::new();
        let mut cursor = target;
        while cursor != self.private_branch {
            let Some(&(_, edge)) = came_from.iter().find(|(to, _)| *to == cursor) else {
                return Err(RepokitError::UserError(format!(
                    "branch '{}' is not reachable from '{}' through forward edges",
                    target, self.private_branch
                )));
            };
            path.push(edge.clone());
            cursor = edge.from.as_str();
        }
        path.reverse();
        Ok(path)
    }

    /// Public branches the private branch cannot reach through forward edges.
    pub fn unreachable_public_branches(&self) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::from([self.private_branch.as_str()]);
        let mut queue: VecDeque<&str> = VecDeque::from([self.private_branch.as_str()]);
        while let Some(current) = queue.pop_front() {
            for edge in self.flow.iter().filter(|e| e.from == current) {
                if seen.insert(edge.to.as_str()) {
                    queue.push_back(edge.to.as_str());
                }
            }
        }
        self.public_branches()
            .map(|b| b.name.as_str())
            .filter(|name| !seen.contains(name))
            .collect()
    }
}
