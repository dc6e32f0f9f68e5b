//! Configuration types and defaults for repokit.

use crate::patterns::{PatternKind, PatternScope};
use crate::sanitize::MergeMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which catalog of private directories to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrivateSetSelector {
    /// private, revisions, logs, convos
    #[default]
    Standard,
    /// standard plus credentials, secrets, local
    Enhanced,
}

impl PrivateSetSelector {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "enhanced" => Some(Self::Enhanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Enhanced => "enhanced",
        }
    }
}

/// A forward (promotion) edge of a custom strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
}

/// A user-supplied branch strategy.
///
/// ```yaml
/// custom_strategy:
///   branches: [private, dev, main]
///   worktrees: [main, docs]
///   private_branch: private
///   flow:
///     - { from: private, to: dev }
///     - { from: dev, to: main }
///   roles: { docs: custom }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomStrategySpec {
    /// Declared branches, in declaration order.
    pub branches: Vec<String>,

    /// Branches that get a dedicated working copy. Names not in `branches`
    /// are added implicitly with role `custom`.
    pub worktrees: Vec<String>,

    pub private_branch: Option<String>,

    pub flow: Vec<FlowEdge>,

    /// Explicit roles by branch name; unlisted branches get a role from their name.
    pub roles: BTreeMap<String, String>,

    /// Defaults to the private branch.
    pub default_branch: Option<String>,
}

/// A configured sensitive pattern: either a bare glob or a full description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensitivePatternConfig {
    /// A path glob, case-insensitive.
    Glob(String),
    Full {
        pattern: String,
        #[serde(default)]
        kind: PatternKind,
        #[serde(default)]
        scope: PatternScope,
        #[serde(default)]
        case_sensitive: bool,
    },
}

/// Sensitive-content settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitiveConfig {
    /// Extra patterns, tagged `custom`, checked in addition to the built-ins.
    pub patterns: Vec<SensitivePatternConfig>,

    /// Files larger than this are rejected on every branch.
    pub max_file_bytes: u64,

    /// Also scan staged file contents for secret material.
    pub scan_content: bool,
}

impl Default for SensitiveConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            max_file_bytes: default_max_file_bytes(),
            scan_content: true,
        }
    }
}

/// A branch-name rule selecting how incoming history is merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRuleConfig {
    /// Exact branch name or glob such as `release/*`.
    pub pattern: String,
    pub mode: MergeMode,
}

/// Commit-message redaction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Extra case-insensitive regexes; a matching message line is redacted.
    pub phrases: Vec<String>,

    pub placeholder: String,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            phrases: Vec::new(),
            placeholder: default_placeholder(),
        }
    }
}

pub(crate) fn default_strategy() -> String {
    "standard".to_string()
}
pub(crate) fn default_worktrees_dir() -> String {
    ".worktrees".to_string()
}
pub(crate) fn default_remote() -> String {
    "origin".to_string()
}
pub(crate) fn default_lock_stale_minutes() -> u32 {
    120
}
pub(crate) fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}
pub(crate) fn default_placeholder() -> String {
    "[REDACTED]".to_string()
}

/// The production branch's working copy is the directory collaborators see.
pub(crate) fn default_branch_directories() -> BTreeMap<String, String> {
    BTreeMap::from([("main".to_string(), "github".to_string())])
}
