//! Squash commit messages.

use super::redact::Redactor;
use crate::vcs::CommitInfo;

const MAX_KEY_CHANGES: usize = 5;
const MAX_AUTHORS: usize = 3;
const NOISE: &[&str] = &["merge", "wip", "temp", "fix typo"];
const GENERIC_TITLE: &str = "Promote changes";

/// What a squashed range contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquashSummary {
    pub source: String,
    pub target: String,
    /// Title line, before redaction.
    pub title: String,
    /// Up to five distinct commit summaries, oldest first, before redaction.
    pub key_changes: Vec<String>,
    pub commit_count: usize,
    /// Distinct author names in order of first appearance.
    pub authors: Vec<String>,
    pub files_changed: usize,
}

impl SquashSummary {
    /// Summarize `commits` (oldest first) merged from `source` into `target`.
    ///
    /// Promotions along the strategy get a `Promote` title; other branches a
    /// `feat:` title derived from the last segment of the branch name.
    pub fn build(
        source: &str,
        target: &str,
        commits: &[CommitInfo],
        files_changed: usize,
        is_promotion: bool,
    ) -> Self {
        let title = if is_promotion {
            promote_title(source, target)
        } else {
            let feature = source
                .rsplit('/')
                .next()
                .unwrap_or(source)
                .replace(['-', '_'], " ");
            format!("feat: {}", feature.trim())
        };

        let mut key_changes: Vec<String> = Vec::new();
        let mut authors: Vec<String> = Vec::new();
        for commit in commits {
            if !authors.contains(&commit.author_name) {
                authors.push(commit.author_name.clone());
            }
            let summary = commit.summary().trim();
            let lower = summary.to_lowercase();
            let noisy = commit.is_merge() || NOISE.iter().any(|n| lower.contains(n));
            if !noisy
                && !summary.is_empty()
                && key_changes.len() < MAX_KEY_CHANGES
                && !key_changes.iter().any(|k| k == summary)
            {
                key_changes.push(summary.to_string());
            }
        }

        Self {
            source: source.to_string(),
            target: target.to_string(),
            title,
            key_changes,
            commit_count: commits.len(),
            authors,
            files_changed,
        }
    }

    /// The final message with sensitive lines removed.
    ///
    /// A redacted title is replaced by the `Promote <source> into <target>`
    /// template (or a generic title when the branch names themselves are
    /// sensitive), and so is the whole message when nothing else survives.
    pub fn render(&self, redactor: &Redactor) -> String {
        let keep = |line: &str| !redactor.is_sensitive_line(line);

        let title = if keep(self.title.as_str()) {
            self.title.clone()
        } else {
            self.fallback_title(redactor)
        };

        let mut lines = vec![title, String::new()];

        let changes: Vec<String> = self
            .key_changes
            .iter()
            .map(|c| format!("- {}", c))
            .filter(|l| keep(l.as_str()))
            .collect();
        if !changes.is_empty() {
            lines.push("Key changes:".to_string());
            lines.extend(changes);
            lines.push(String::new());
        }

        let mut authors = self
            .authors
            .iter()
            .take(MAX_AUTHORS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if self.authors.len() > MAX_AUTHORS {
            authors.push_str(" and others");
        }
        let stats = [
            format!("Squashed {} commits from {}", self.commit_count, self.source),
            format!("Authors: {}", authors),
            format!("Files changed: {}", self.files_changed),
        ];
        lines.extend(stats.into_iter().filter(|l| keep(l.as_str())));

        match redactor.redact_summary(&lines.join("\n")) {
            Some(message) => message,
            None => self.fallback_title(redactor),
        }
    }

    fn fallback_title(&self, redactor: &Redactor) -> String {
        let template = promote_title(&self.source, &self.target);
        if redactor.is_sensitive_line(&template) {
            GENERIC_TITLE.to_string()
        } else {
            template
        }
    }
}

fn promote_title(source: &str, target: &str) -> String {
    format!("Promote {} into {}", source, target)
}
