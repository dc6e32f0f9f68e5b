//! Per-branch classification of candidate commits.

use super::types::{CommitClassification, StagedChange, Violation};
use crate::config::SensitiveConfig;
use crate::error::{RepokitError, Result, UnsafeCommit};
use crate::patterns::PatternMatcher;
use crate::strategy::BranchGraph;
use crate::vcs::CommitPaths;
use tracing::debug;

/// Applies the sensitive patterns according to a branch graph.
///
/// Holds no repository state; every call names the branch it is about.
#[derive(Debug, Clone, Copy)]
pub struct PrivateContentGuard<'a> {
    graph: &'a BranchGraph,
    matcher: &'a PatternMatcher,
    max_file_bytes: u64,
    scan_content: bool,
}

impl<'a> PrivateContentGuard<'a> {
    pub fn new(
        graph: &'a BranchGraph,
        matcher: &'a PatternMatcher,
        sensitive: &SensitiveConfig,
    ) -> Self {
        Self {
            graph,
            matcher,
            max_file_bytes: sensitive.max_file_bytes,
            scan_content: sensitive.scan_content,
        }
    }

    pub fn graph(&self) -> &'a BranchGraph {
        self.graph
    }

    pub fn matcher(&self) -> &'a PatternMatcher {
        self.matcher
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Whether content should be read for scanning at all.
    pub fn scans_content(&self) -> bool {
        self.scan_content && self.matcher.has_content_patterns()
    }

    /// Classify `staged` as a candidate commit on `branch`.
    pub fn classify(&self, branch: &str, staged: &[StagedChange]) -> CommitClassification {
        let public = self.graph.is_public(branch);
        let mut result = CommitClassification::new(branch);

        for change in staged {
            if public {
                if let Some(m) = self.matcher.sensitive_path_match(&change.path) {
                    result.violations.push(Violation {
                        path: change.path.clone(),
                        pattern: m.pattern,
                        set: m.set,
                        in_content: false,
                    });
                } else if self.scan_content
                    && let Some(content) = &change.content
                    && let Some(m) = self.matcher.content_match(content)
                {
                    result.violations.push(Violation {
                        path: change.path.clone(),
                        pattern: m.pattern,
                        set: m.set,
                        in_content: true,
                    });
                }
            }

            if change.size > self.max_file_bytes {
                result.oversized.push((change.path.clone(), change.size));
            }

            if let Some(m) = self.matcher.reserved_name_match(&change.path) {
                result.warnings.push(format!(
                    "'{}' uses a reserved Windows name ({}) and cannot be checked out on Windows",
                    change.path, m.pattern
                ));
            }
        }

        debug!(
            branch,
            public,
            files = staged.len(),
            violations = result.violations.len(),
            oversized = result.oversized.len(),
            "classified staged changes"
        );
        result
    }

    /// Classify and turn any violation into an error.
    ///
    /// Private-content violations are reported before oversized files.
    pub fn validate(&self, branch: &str, staged: &[StagedChange]) -> Result<CommitClassification> {
        let classification = self.classify(branch, staged);
        if classification.is_clean() {
            return Ok(classification);
        }
        if !classification.violations.is_empty() {
            return Err(RepokitError::PrivateContentDetected {
                branch: branch.to_string(),
                paths: classification.violation_paths(),
            });
        }
        if !classification.oversized.is_empty() {
            return Err(RepokitError::OversizedFile {
                limit: self.max_file_bytes,
                files: classification.oversized,
            });
        }
        Ok(classification)
    }

    /// Commits whose touched paths may not appear in `target`'s history.
    ///
    /// Always empty for the private branch.
    pub fn unsafe_commits(&self, target: &str, commits: &[CommitPaths]) -> Vec<UnsafeCommit> {
        if !self.graph.is_public(target) {
            return Vec::new();
        }
        commits
            .iter()
            .filter_map(|commit| {
                let paths: Vec<String> = commit
                    .paths
                    .iter()
                    .filter(|p| self.matcher.is_sensitive_path(p))
                    .cloned()
                    .collect();
                (!paths.is_empty()).then(|| UnsafeCommit {
                    sha: commit.sha.clone(),
                    summary: commit.summary.clone(),
                    paths,
                })
            })
            .collect()
    }
}
