//! Line-level redaction of commit messages.

use crate::config::{Config, RedactionConfig};
use crate::directories::DirectoryCatalog;
use crate::error::{RepokitError, Result};
use crate::patterns::PatternMatcher;
use regex::{Regex, RegexBuilder};

/// Phrases that make a message line unfit for a public branch.
const SENSITIVE_PHRASES: &[&str] = &[
    r"secret",
    r"passw(or)?d",
    r"token",
    r"credential",
    r"api[\s_-]?key",
    r"private[\s_-]?key",
    r"do not commit",
    r"@nocommit",
    r"todo:\s*hack",
    r"fixme:\s*security",
    r"\bhack:",
    r"\bxxx:",
    r"\bclaude\.md\b",
    r"\.claude/",
    r"\.env\b",
];

/// Replaces sensitive message lines with a placeholder.
///
/// A line is sensitive when it contains a sensitive phrase, or when one of
/// its words names a path the pattern matcher treats as sensitive.
#[derive(Debug)]
pub struct Redactor {
    patterns: Vec<Regex>,
    matcher: Option<PatternMatcher>,
    placeholder: String,
}

impl Redactor {
    /// Built-in phrases, a path-disclosure phrase per private directory, and
    /// the configured phrases. All case-insensitive.
    pub fn new(config: &RedactionConfig, private_dirs: &[String]) -> Result<Self> {
        let disclosures = private_dirs
            .iter()
            .map(|dir| format!(r"\b{}/", regex::escape(dir.trim_matches('/'))));
        let sources = SENSITIVE_PHRASES
            .iter()
            .map(|s| s.to_string())
            .chain(disclosures)
            .chain(config.phrases.iter().cloned());

        let mut patterns = Vec::new();
        for source in sources {
            let regex = RegexBuilder::new(&source)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    RepokitError::UserError(format!(
                        "invalid redaction phrase '{}': {}\n\
                         Fix: edit redaction.phrases in your repokit config.",
                        source, e
                    ))
                })?;
            patterns.push(regex);
        }

        Ok(Self {
            patterns,
            matcher: None,
            placeholder: config.placeholder.clone(),
        })
    }

    /// Also redact lines mentioning a path `matcher` considers sensitive.
    pub fn with_matcher(mut self, matcher: PatternMatcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Phrases from `config` plus every configured sensitive path pattern.
    pub fn from_config(config: &Config) -> Result<Self> {
        let private = DirectoryCatalog::from_config(config).private_directories(config.private_set);
        Ok(Self::new(&config.redaction, &private.directories)?
            .with_matcher(PatternMatcher::from_config(config)?))
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn is_sensitive_line(&self, line: &str) -> bool {
        if self.patterns.iter().any(|p| p.is_match(line)) {
            return true;
        }
        match &self.matcher {
            Some(matcher) => words(line).any(|word| matcher.is_sensitive_path(word)),
            None => false,
        }
    }

    /// Every sensitive line replaced by the placeholder.
    pub fn redact(&self, message: &str) -> String {
        message
            .lines()
            .map(|line| {
                if self.is_sensitive_line(line) {
                    self.placeholder.as_str()
                } else {
                    line
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Sensitive lines dropped entirely. `None` when no non-blank line remains.
    pub fn redact_summary(&self, message: &str) -> Option<String> {
        let kept: Vec<&str> = message
            .lines()
            .filter(|line| !self.is_sensitive_line(line))
            .collect();
        if kept.iter().all(|l| l.trim().is_empty()) {
            return None;
        }
        Some(kept.join("\n").trim().to_string())
    }
}

/// Path-like words of `line`: split on whitespace and punctuation that never
/// appears in a file name, with sentence-ending dots trimmed.
fn words(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| {
        c.is_whitespace()
            || matches!(
                c,
                ',' | ';' | ':' | '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>' | '"' | '\'' | '`'
                    | '!' | '?' | '='
            )
    })
    .map(|word| word.trim_end_matches('.'))
    .filter(|word| !word.is_empty())
}
