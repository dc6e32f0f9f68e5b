//! Adoption planning: everything decided before the repository is touched.

use crate::config::Config;
use crate::directories::{DirectoryCatalog, PrivateDirectorySet, ResolvedDirectorySet};
use crate::error::Result;
use crate::patterns::PatternMatcher;
use crate::strategy::{BranchGraph, resolve_from_config};
use std::path::{Path, PathBuf};

/// The target shape of a repository.
///
/// Built purely from configuration; lookup errors (unknown strategy, profile
/// or group, bad pattern) surface here before any state exists.
#[derive(Debug)]
pub struct AdoptionPlan {
    pub root: PathBuf,
    pub graph: BranchGraph,
    pub directories: ResolvedDirectorySet,
    pub private_directories: PrivateDirectorySet,
    pub matcher: PatternMatcher,
    worktrees_dir: String,
    branch_directories: Vec<(String, String)>,
}

impl AdoptionPlan {
    pub fn build(root: &Path, config: &Config) -> Result<Self> {
        let graph = resolve_from_config(config)?;
        let (directories, private_directories) =
            DirectoryCatalog::from_config(config).resolve_config(config)?;
        let matcher = PatternMatcher::from_config(config)?;

        Ok(Self {
            root: root.to_path_buf(),
            graph,
            directories,
            private_directories,
            matcher,
            worktrees_dir: config.worktrees_dir.clone(),
            branch_directories: config
                .branch_directories
                .iter()
                .map(|(b, d)| (b.clone(), d.clone()))
                .collect(),
        })
    }

    /// Directory holding every branch working copy.
    pub fn worktrees_root(&self) -> PathBuf {
        self.root.join(&self.worktrees_dir)
    }

    /// Configured worktrees directory, relative to the root.
    pub fn worktrees_dir(&self) -> &str {
        &self.worktrees_dir
    }

    /// Working copy path for `branch`.
    ///
    /// Uses the configured directory name for the branch, else the branch
    /// name with `/` flattened to `-`.
    pub fn worktree_path(&self, branch: &str) -> PathBuf {
        let dir = self
            .branch_directories
            .iter()
            .find(|(b, _)| b == branch)
            .map(|(_, d)| d.clone())
            .unwrap_or_else(|| branch.replace('/', "-"));
        self.worktrees_root().join(dir)
    }

    /// Every directory to create in the private working copy: the resolved
    /// set followed by private directories it does not already name.
    pub fn private_tree_directories(&self) -> Vec<String> {
        let mut dirs: Vec<String> = self.directories.iter().map(String::from).collect();
        for dir in &self.private_directories.directories {
            if !dirs.contains(dir) {
                dirs.push(dir.clone());
            }
        }
        dirs
    }
}
