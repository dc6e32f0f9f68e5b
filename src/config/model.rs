//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Merged repokit configuration.
///
/// Unknown fields in any YAML layer are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Branch strategy
    // =========================================================================
    /// Catalog strategy name (simple, standard, gitflow, github-flow, minimal).
    pub strategy: String,

    /// Custom strategy; takes precedence over `strategy` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_strategy: Option<CustomStrategySpec>,

    /// Worktree directory name per branch (default: main lives in `github`).
    pub branch_directories: BTreeMap<String, String>,

    /// Where branch worktrees are created, relative to the repository root.
    pub worktrees_dir: String,

    // =========================================================================
    // Directory layout
    // =========================================================================
    /// Profile replacing the built-in default directory set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_profile: Option<String>,

    pub directory_groups: Vec<String>,

    /// Explicit directories, unioned last.
    pub directories: Vec<String>,

    pub private_set: PrivateSetSelector,

    /// Additional or replacement profiles.
    pub profiles: BTreeMap<String, Vec<String>>,

    /// Additional or replacement groups.
    pub groups: BTreeMap<String, Vec<String>>,

    /// Conceptual directory name to actual name (e.g. `src` -> `mypkg`).
    pub directory_types: BTreeMap<String, String>,

    // =========================================================================
    // Content protection
    // =========================================================================
    pub sensitive: SensitiveConfig,

    /// Rules checked before the built-in merge rules.
    pub merge_rules: Vec<MergeRuleConfig>,

    pub redaction: RedactionConfig,

    // =========================================================================
    // Locks and remote
    // =========================================================================
    /// Minutes after which a lock is considered stale.
    pub lock_stale_minutes: u32,

    /// Remote that `publish` pushes to.
    pub remote: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            custom_strategy: None,
            branch_directories: default_branch_directories(),
            worktrees_dir: default_worktrees_dir(),
            directory_profile: None,
            directory_groups: Vec::new(),
            directories: Vec::new(),
            private_set: PrivateSetSelector::default(),
            profiles: BTreeMap::new(),
            groups: BTreeMap::new(),
            directory_types: BTreeMap::new(),
            sensitive: SensitiveConfig::default(),
            merge_rules: Vec::new(),
            redaction: RedactionConfig::default(),
            lock_stale_minutes: default_lock_stale_minutes(),
            remote: default_remote(),
        }
    }
}
