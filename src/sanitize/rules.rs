//! Branch-name merge rules.

use crate::config::MergeRuleConfig;
use crate::error::{RepokitError, Result};
use crate::strategy::BranchGraph;
use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};

/// How incoming history is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Keep every commit.
    Preserve,
    /// Collapse the range into one commit.
    Squash,
    /// The caller has to choose.
    Interactive,
}

impl MergeMode {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "preserve" => Some(Self::Preserve),
            "squash" => Some(Self::Squash),
            "interactive" => Some(Self::Interactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Squash => "squash",
            Self::Interactive => "interactive",
        }
    }
}

impl std::fmt::Display for MergeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const BUILTIN_RULES: &[(&str, MergeMode)] = &[
    ("prototype/*", MergeMode::Squash),
    ("experiment/*", MergeMode::Squash),
    ("spike/*", MergeMode::Squash),
    ("wip/*", MergeMode::Squash),
    ("fix/*", MergeMode::Preserve),
    ("bugfix/*", MergeMode::Preserve),
    ("hotfix/*", MergeMode::Preserve),
    ("patch/*", MergeMode::Preserve),
];

/// One compiled rule.
#[derive(Debug, Clone)]
pub struct MergeRule {
    pub pattern: String,
    pub mode: MergeMode,
    matcher: GlobMatcher,
}

impl MergeRule {
    pub fn new(pattern: &str, mode: MergeMode) -> Result<Self> {
        let matcher = Glob::new(pattern)
            .map_err(|e| {
                RepokitError::UserError(format!(
                    "invalid merge rule pattern '{}': {}\n\
                     Fix: edit merge_rules in your repokit config.",
                    pattern, e
                ))
            })?
            .compile_matcher();
        Ok(Self {
            pattern: pattern.to_string(),
            mode,
            matcher,
        })
    }

    pub fn matches(&self, branch: &str) -> bool {
        self.matcher.is_match(branch)
    }

    fn is_exact(&self) -> bool {
        literal_prefix(&self.pattern).len() == self.pattern.len()
    }
}

fn literal_prefix(pattern: &str) -> &str {
    let end = pattern
        .find(['*', '?', '[', '{'])
        .unwrap_or(pattern.len());
    &pattern[..end]
}

/// Sort most specific first: exact names, then longer literal prefixes.
/// The sort is stable, so equally specific rules keep their order.
fn sort_by_specificity(rules: &mut [MergeRule]) {
    rules.sort_by_key(|r| (!r.is_exact(), std::cmp::Reverse(literal_prefix(&r.pattern).len())));
}

/// Ordered rule list. Configured rules come before graph rules, which come
/// before the built-ins; each tier is sorted most specific first.
#[derive(Debug, Clone)]
pub struct MergeRules {
    rules: Vec<MergeRule>,
}

impl MergeRules {
    /// Built-ins preceded by `configured`.
    pub fn new(configured: &[MergeRuleConfig]) -> Result<Self> {
        Self::build(configured, None)
    }

    /// Like [`MergeRules::new`], with exact rules for the graph's branches:
    /// the private branch squashes, public branches preserve.
    pub fn for_graph(configured: &[MergeRuleConfig], graph: &BranchGraph) -> Result<Self> {
        Self::build(configured, Some(graph))
    }

    fn build(configured: &[MergeRuleConfig], graph: Option<&BranchGraph>) -> Result<Self> {
        let mut user = configured
            .iter()
            .map(|r| MergeRule::new(&r.pattern, r.mode))
            .collect::<Result<Vec<_>>>()?;
        sort_by_specificity(&mut user);

        let mut from_graph = Vec::new();
        if let Some(graph) = graph {
            for branch in &graph.branches {
                let mode = if branch.is_private {
                    MergeMode::Squash
                } else {
                    MergeMode::Preserve
                };
                from_graph.push(MergeRule::new(&glob_escape(&branch.name), mode)?);
            }
        }

        let mut builtin = BUILTIN_RULES
            .iter()
            .map(|(p, m)| MergeRule::new(p, *m))
            .collect::<Result<Vec<_>>>()?;
        sort_by_specificity(&mut builtin);

        let mut rules = user;
        rules.extend(from_graph);
        rules.extend(builtin);
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[MergeRule] {
        &self.rules
    }

    /// The first matching rule's mode; `Interactive` when nothing matches.
    pub fn mode_for(&self, branch: &str) -> MergeMode {
        self.rules
            .iter()
            .find(|r| r.matches(branch))
            .map(|r| r.mode)
            .unwrap_or(MergeMode::Interactive)
    }

    /// The mode to use for merging `branch`.
    ///
    /// An explicit choice wins over the rules. Without one, an `Interactive`
    /// classification is an error.
    pub fn resolve(&self, branch: &str, explicit: Option<MergeMode>) -> Result<MergeMode> {
        let mode = match explicit {
            Some(MergeMode::Interactive) | None => self.mode_for(branch),
            Some(choice) => choice,
        };
        if mode == MergeMode::Interactive {
            return Err(RepokitError::MergeModeRequired {
                branch: branch.to_string(),
            });
        }
        Ok(mode)
    }
}

/// Escape glob metacharacters so a branch name matches only itself.
fn glob_escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '{' | '}') {
            out.push('[');
            out.push(c);
            out.push(']');
        } else {
            out.push(c);
        }
    }
    out
}
