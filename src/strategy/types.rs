//! Branch graph building blocks.

use serde::{Deserialize, Serialize};

/// What a branch is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchRole {
    Production,
    Development,
    Staging,
    Testing,
    Live,
    Personal,
    Custom,
}

impl BranchRole {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "production" => Some(Self::Production),
            "development" => Some(Self::Development),
            "staging" => Some(Self::Staging),
            "testing" => Some(Self::Testing),
            "live" => Some(Self::Live),
            "personal" => Some(Self::Personal),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Testing => "testing",
            Self::Live => "live",
            Self::Personal => "personal",
            Self::Custom => "custom",
        }
    }

    /// Role implied by a conventional branch name.
    pub fn from_branch_name(name: &str, is_private: bool) -> Self {
        if is_private {
            return Self::Personal;
        }
        match name {
            "main" | "master" => Self::Production,
            "dev" | "develop" => Self::Development,
            "staging" | "release" => Self::Staging,
            "test" => Self::Testing,
            "live" | "prod" => Self::Live,
            _ => Self::Custom,
        }
    }
}

impl std::fmt::Display for BranchRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge between two branches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// One branch of a resolved strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSpec {
    pub name: String,
    pub role: BranchRole,
    pub is_private: bool,
    pub has_worktree: bool,
    /// Forward successors, in edge declaration order.
    pub flow_targets: Vec<String>,
}
