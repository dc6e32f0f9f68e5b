//! Guard inputs and results.

use crate::patterns::PatternSet;

/// A file about to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange {
    /// Repository-relative path with forward slashes.
    pub path: String,
    /// Blob size in bytes.
    pub size: u64,
    /// Text content when it was read for scanning; `None` for binary or
    /// unscanned files.
    pub content: Option<String>,
}

impl StagedChange {
    /// A change described by path and size only.
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            content: None,
        }
    }

    pub fn with_content(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            size: content.len() as u64,
            content: Some(content),
        }
    }
}

/// Why a path may not be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub pattern: String,
    pub set: PatternSet,
    /// The match came from the file's content rather than its path.
    pub in_content: bool,
}

/// Outcome of classifying one candidate commit. Computed fresh for every
/// attempt and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitClassification {
    pub branch: String,
    pub violations: Vec<Violation>,
    /// `(path, size)` of files above the size limit.
    pub oversized: Vec<(String, u64)>,
    pub warnings: Vec<String>,
}

impl CommitClassification {
    pub fn new(branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
            violations: Vec::new(),
            oversized: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// No violations and nothing oversized. Warnings do not count.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.oversized.is_empty()
    }

    /// Offending paths, each listed once, in staging order.
    pub fn violation_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for violation in &self.violations {
            if !paths.contains(&violation.path) {
                paths.push(violation.path.clone());
            }
        }
        paths
    }
}
